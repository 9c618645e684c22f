//! A view's attachment to the shared channel.
//!
//! Frames are decoded and handed to a delivery callback one at a time, in
//! arrival order. The callback is expected to enqueue into the app's single
//! event queue, so each handler runs to completion before the next message.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::api::Envelope;
use crate::channel::{ChannelEvent, MessageSource};
use crate::config::AppConfig;

/// Fixed-delay retry with a cap on consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Retries allowed after the first failure; one more failure gives up.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(3000),
            max_retries: 10,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            delay: config.retry_delay(),
            max_retries: config.max_retries,
        }
    }
}

/// Handle to a running subscription. Dropping it (or calling
/// [`Subscription::unsubscribe`]) stops delivery immediately.
pub struct Subscription {
    guard: DropGuard,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn spawn<S, F>(source: Arc<S>, policy: RetryPolicy, deliver: F) -> Self
    where
        S: MessageSource,
        F: FnMut(Envelope) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(source, policy, cancel.clone(), deliver));
        Self {
            guard: cancel.drop_guard(),
            handle,
        }
    }

    /// Stop delivery. Requests already sent are not cancelled. The returned
    /// handle resolves once the subscription task has exited.
    pub fn unsubscribe(self) -> JoinHandle<()> {
        let Self { guard, handle } = self;
        drop(guard);
        handle
    }

    /// True once the subscription has stopped, either torn down or after
    /// exhausting its retries.
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run<S, F>(source: Arc<S>, policy: RetryPolicy, cancel: CancellationToken, mut deliver: F)
where
    S: MessageSource,
    F: FnMut(Envelope) + Send + 'static,
{
    let mut failures: u32 = 0;

    loop {
        let subscribed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = source.subscribe() => result,
        };

        let reason = match subscribed {
            Ok(mut rx) => loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    event = rx.recv() => event,
                };
                match event {
                    Ok(ChannelEvent::Frame(text)) => {
                        failures = 0;
                        match Envelope::decode(&text) {
                            Ok(envelope) => deliver(envelope),
                            Err(e) => tracing::warn!("skipping undecodable frame: {e}"),
                        }
                    }
                    Ok(ChannelEvent::Fault(reason)) => break reason.to_string(),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscription fell behind; frames dropped");
                    }
                    Err(RecvError::Closed) => break "channel closed".to_string(),
                }
            },
            Err(e) => e.to_string(),
        };

        failures += 1;
        if failures > policy.max_retries {
            // Nothing user-visible: the view stays in whatever state it was in.
            tracing::error!(attempts = failures, %reason, "giving up on channel subscription");
            return;
        }
        tracing::warn!(attempt = failures, %reason, "channel subscription failed; retrying");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}
