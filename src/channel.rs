//! The process-wide message channel.
//!
//! One WebSocket connection is shared by every view. Inbound text frames are
//! fanned out on a broadcast channel; each view filters what it cares about
//! by operation tag. Outbound requests go through a single queue so they hit
//! the socket in the order they were sent.

use std::future::Future;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify, broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::api::{ClientRequest, ProtocolError};

/// Inbound frames buffered per subscriber before it starts lagging.
const INBOUND_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("channel is not connected")]
    Disconnected,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// What a subscriber sees on the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A raw text frame from the server.
    Frame(Arc<str>),
    /// The transport failed; subscribers should resubscribe.
    Fault(Arc<str>),
}

/// Anything a subscription can attach to.
pub trait MessageSource: Send + Sync + 'static {
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<broadcast::Receiver<ChannelEvent>, ChannelError>> + Send;
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    url: String,
    inbound: broadcast::Sender<ChannelEvent>,
    /// Writer half of the live connection, if any.
    link: Mutex<Option<mpsc::UnboundedSender<String>>>,
    queue: mpsc::UnboundedSender<String>,
    /// Signalled whenever a subscriber attaches.
    attached: Notify,
}

impl Channel {
    /// Create the channel and spawn its outbound pump. The socket itself is
    /// opened lazily on first subscribe or send.
    pub fn open(url: impl Into<String>) -> Self {
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(ChannelInner {
            url: url.into(),
            inbound,
            link: Mutex::new(None),
            queue,
            attached: Notify::new(),
        });
        tokio::spawn(pump_outbound(Arc::clone(&inner), queue_rx));
        Self { inner }
    }

    /// Queue a request. Once queued it cannot be cancelled. Requests are
    /// held while no subscriber is attached, so a reply always has somewhere
    /// to go.
    pub fn send(&self, request: &ClientRequest, request_id: Uuid) -> Result<(), ChannelError> {
        let text = request.encode(request_id)?;
        tracing::debug!(op = request.op().tag(), %request_id, "queueing request");
        self.inner
            .queue
            .send(text)
            .map_err(|_| ChannelError::Disconnected)
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }
}

impl MessageSource for Channel {
    async fn subscribe(&self) -> Result<broadcast::Receiver<ChannelEvent>, ChannelError> {
        // Join before connecting so no frame from the new socket is missed.
        let rx = self.inner.inbound.subscribe();
        self.inner.ensure_connected().await?;
        self.inner.attached.notify_waiters();
        Ok(rx)
    }
}

impl ChannelInner {
    async fn wait_for_subscriber(&self) {
        loop {
            let attached = self.attached.notified();
            if self.inbound.receiver_count() > 0 {
                return;
            }
            tracing::debug!("holding outbound request until a subscriber attaches");
            attached.await;
        }
    }

    /// Return the writer for the live connection, connecting first if the
    /// previous one has gone away.
    async fn ensure_connected(&self) -> Result<mpsc::UnboundedSender<String>, ChannelError> {
        let mut link = self.link.lock().await;
        if let Some(tx) = link.as_ref()
            && !tx.is_closed()
        {
            return Ok(tx.clone());
        }

        let (ws, _) = connect_async(self.url.as_str()).await?;
        tracing::info!(url = %self.url, "channel connected");

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(ws, rx, self.inbound.clone()));
        *link = Some(tx.clone());
        Ok(tx)
    }
}

async fn pump_outbound(inner: Arc<ChannelInner>, mut queue: mpsc::UnboundedReceiver<String>) {
    while let Some(text) = queue.recv().await {
        inner.wait_for_subscriber().await;
        match inner.ensure_connected().await {
            Ok(tx) => {
                if tx.send(text).is_err() {
                    tracing::warn!("connection closed before request was written");
                }
            }
            Err(e) => {
                tracing::warn!("dropping outbound request: {e}");
                let _ = inner
                    .inbound
                    .send(ChannelEvent::Fault(Arc::from(e.to_string())));
            }
        }
    }
}

/// Drive one WebSocket connection until either side closes it.
async fn run_connection(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    inbound: broadcast::Sender<ChannelEvent>,
) {
    let (mut sink, mut stream) = ws.split();

    let reason = loop {
        tokio::select! {
            text = outbound.recv() => {
                let Some(text) = text else {
                    break "channel dropped".to_string();
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    break e.to_string();
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    // No subscribers is fine; the frame is simply not wanted.
                    let _ = inbound.send(ChannelEvent::Frame(Arc::from(text.as_str())));
                }
                Some(Ok(Message::Close(_))) | None => break "closed by server".to_string(),
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
            },
        }
    };

    tracing::info!(%reason, "channel disconnected");
    let _ = inbound.send(ChannelEvent::Fault(Arc::from(reason)));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;
    use crate::api::types::GetUserDetailsForm;
    use crate::subscription::{RetryPolicy, Subscription};
    use crate::view_state::SortType;

    /// Serve two connections: the first is dropped as soon as it opens, the
    /// second answers every request with a user-details frame.
    async fn flaky_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(accept_async(stream).await.unwrap());

            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            while let Some(Ok(message)) = ws.next().await {
                if message.is_text() {
                    let reply = r#"{"op":"GetUserDetails","follows":[]}"#;
                    if ws.send(Message::Text(reply.into())).await.is_err() {
                        break;
                    }
                }
            }
        });
        url
    }

    fn details_request() -> ClientRequest {
        ClientRequest::GetUserDetails(GetUserDetailsForm {
            user_id: None,
            username: Some("alice".into()),
            sort: SortType::New,
            saved_only: false,
            page: 1,
            limit: 20,
            auth: None,
        })
    }

    #[tokio::test]
    async fn request_sent_while_resubscribing_gets_its_reply() {
        let channel = Channel::open(flaky_server().await);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let policy = RetryPolicy {
            delay: Duration::from_millis(500),
            max_retries: 3,
        };
        let _sub = Subscription::spawn(Arc::new(channel.clone()), policy, move |env| {
            let _ = tx.send(env);
        });

        // First connection drops; the subscription is now sleeping.
        tokio::time::sleep(Duration::from_millis(150)).await;
        channel.send(&details_request(), Uuid::new_v4()).unwrap();

        let reply = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("reply reaches the resubscribed view")
            .unwrap();
        assert_eq!(reply.op, "GetUserDetails");
    }

    #[tokio::test]
    async fn failed_subscribe_releases_its_receiver() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let channel = Channel::open(format!("ws://{}", listener.local_addr().unwrap()));
        drop(listener);

        // Connecting fails, and the receiver taken for it is released again.
        assert!(channel.subscribe().await.is_err());
        assert_eq!(channel.inner.inbound.receiver_count(), 0);
    }
}
