use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, bail, eyre};
use tokio::sync::mpsc;

use crate::api::Envelope;
use crate::channel::{Channel, MessageSource};
use crate::command::parse_location;
use crate::config::AppConfig;
use crate::profile::{Effect, ProfileOptions, ProfileView};
use crate::session::{LocalSession, SessionStore};
use crate::subscription::{RetryPolicy, Subscription};
use crate::ui::error_popup::humanize;
use crate::view_state::LocationParams;

/// How long a one-shot command waits for the server once connected.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "profiletui", about = "TUI and CLI for Lemmy user profiles")]
pub struct Cli {
    /// WebSocket endpoint of the instance, e.g. wss://lemmy.ml/api/v1/ws
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Launch the interactive TUI (default)
    Tui {
        /// Profile path (/u/NAME/view/...), profile URL, or username
        path: Option<String>,
    },
    /// Fetch one page of a profile (JSONL)
    Profile {
        /// Profile path, profile URL, or username
        target: String,
        /// overview | comments | posts | saved
        #[arg(long)]
        view: Option<String>,
        /// new | topday | topweek | topmonth | topyear | topall
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        page: Option<i64>,
    },
    /// Save your user settings
    Settings {
        #[arg(long, action = clap::ArgAction::Set)]
        show_nsfw: bool,
    },
}

// ---------------------------------------------------------------------------
// Location helpers (shared with main.rs TUI path)
// ---------------------------------------------------------------------------

/// Where the TUI starts: an explicit path, the configured default, or the
/// signed-in user's own profile.
pub fn start_location(
    path: Option<&str>,
    default_path: Option<&str>,
    own_username: Option<&str>,
) -> eyre::Result<LocationParams> {
    if let Some(path) = path {
        return parse_location(path).ok_or_else(|| eyre!("not a profile path: {path}"));
    }
    if let Some(path) = default_path {
        return parse_location(path).ok_or_else(|| eyre!("default_path is not a profile: {path}"));
    }
    own_username
        .map(LocationParams::for_user)
        .ok_or_else(|| eyre!("no profile given; pass a username or set LEMMY_JWT"))
}

fn profile_location(
    target: &str,
    view: Option<String>,
    sort: Option<String>,
    page: Option<i64>,
) -> eyre::Result<LocationParams> {
    let mut location = parse_location(target).ok_or_else(|| eyre!("not a profile: {target}"))?;
    if view.is_some() {
        location.view = view;
    }
    if sort.is_some() {
        location.sort = sort;
    }
    if let Some(page) = page {
        location.page = Some(page.to_string());
    }
    Ok(location)
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

pub async fn run_command(cmd: CliCommand, config: AppConfig) -> eyre::Result<()> {
    let session: Arc<dyn SessionStore> = Arc::new(LocalSession::load());

    match cmd {
        CliCommand::Tui { .. } => unreachable!("tui is handled in main"),

        CliCommand::Profile {
            target,
            view,
            sort,
            page,
        } => {
            let location = profile_location(&target, view, sort, page)?;
            let mut link = Link::open(&config).await?;
            let mut profile = ProfileView::new(&location, session, options(&config));

            let fetch = profile.refetch();
            link.send_all(vec![fetch])?;
            link.settle(&mut profile, |p| !p.loading).await?;

            let header = serde_json::json!({
                "user": profile.user,
                "follows": profile.follows,
                "moderates": profile.moderates,
                "location": profile.location(),
            });
            println!("{}", serde_json::to_string(&header)?);
            for item in profile.feed() {
                println!("{}", serde_json::to_string(&item)?);
            }
            link.close().await;
        }

        CliCommand::Settings { show_nsfw } => {
            let Some(me) = session.current_user() else {
                bail!("not signed in; set LEMMY_JWT or add it to ~/.config/profiletui/.env");
            };
            let mut link = Link::open(&config).await?;
            let location = LocationParams::for_user(&me.username);
            let mut profile = ProfileView::new(&location, Arc::clone(&session), options(&config));
            profile.settings.show_nsfw = show_nsfw;

            let submit = profile.submit_settings();
            if let Some(message) = first_error(&submit) {
                bail!(humanize(message));
            }
            link.send_all(submit)?;
            link.settle(&mut profile, |p| !p.settings_loading).await?;

            let line = serde_json::json!({
                "user": me.username,
                "show_nsfw": session.current_user().map(|c| c.show_nsfw),
            });
            println!("{}", serde_json::to_string(&line)?);
            link.close().await;
        }
    }

    Ok(())
}

fn options(config: &AppConfig) -> ProfileOptions {
    ProfileOptions {
        fetch_limit: config.fetch_limit,
        site_name: config.site_name.clone(),
    }
}

fn first_error(effects: &[Effect]) -> Option<&str> {
    effects.iter().find_map(|effect| match effect {
        Effect::ShowError(message) => Some(message.as_str()),
        _ => None,
    })
}

/// A channel plus one subscription feeding a local queue.
struct Link {
    channel: Channel,
    subscription: Subscription,
    inbox: mpsc::UnboundedReceiver<Envelope>,
}

impl Link {
    async fn open(config: &AppConfig) -> eyre::Result<Self> {
        let channel = Channel::open(config.server_url.as_str());
        // Connect up front so an unreachable server fails fast.
        channel
            .subscribe()
            .await
            .map_err(|e| eyre!("could not connect to {}: {e}", config.server_url))?;

        let (tx, inbox) = mpsc::unbounded_channel();
        let subscription = Subscription::spawn(
            Arc::new(channel.clone()),
            RetryPolicy::from_config(config),
            move |envelope| {
                let _ = tx.send(envelope);
            },
        );
        Ok(Self {
            channel,
            subscription,
            inbox,
        })
    }

    fn send_all(&self, effects: Vec<Effect>) -> eyre::Result<()> {
        for effect in effects {
            if let Effect::Send {
                request,
                request_id,
            } = effect
            {
                self.channel.send(&request, request_id)?;
            }
        }
        Ok(())
    }

    /// Feed messages to the view until `done` holds. Server errors end the
    /// command.
    async fn settle(
        &mut self,
        profile: &mut ProfileView,
        done: impl Fn(&ProfileView) -> bool,
    ) -> eyre::Result<()> {
        while !done(profile) {
            let envelope = tokio::time::timeout(RESPONSE_TIMEOUT, self.inbox.recv())
                .await
                .map_err(|_| eyre!("timed out waiting for {}", self.channel.url()))?
                .ok_or_else(|| eyre!("lost connection to {}", self.channel.url()))?;

            let effects = profile.handle_message(envelope);
            if let Some(message) = first_error(&effects) {
                bail!(humanize(message));
            }
            if done(profile) {
                break;
            }
            self.send_all(effects)?;
        }
        Ok(())
    }

    async fn close(self) {
        let _ = self.subscription.unsubscribe().await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
