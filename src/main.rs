pub mod api;
pub mod app;
pub mod channel;
pub mod cli;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod event;
pub mod feed;
pub mod profile;
pub mod session;
pub mod settings;
pub mod subscription;
pub mod ui;
pub mod view_state;

use std::sync::Arc;

use app::App;
use channel::Channel;
use clap::Parser;
use cli::{Cli, CliCommand};
use config::{AppConfig, load_config};
use session::{LocalSession, SessionStore};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Initialize tracing (logs to stderr if RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config();
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    match cli.command {
        // No subcommand or explicit `tui` → launch the interactive TUI.
        None => run_tui(config, None).await,
        Some(CliCommand::Tui { path }) => run_tui(config, path).await,
        // All other subcommands → non-interactive JSONL output.
        Some(cmd) => cli::run_command(cmd, config).await,
    }
}

/// Launch the interactive TUI.
async fn run_tui(config: AppConfig, path: Option<String>) -> color_eyre::Result<()> {
    let session = Arc::new(LocalSession::load());
    let own_username = session.current_user().map(|claims| claims.username);

    let location = cli::start_location(
        path.as_deref(),
        config.default_path.as_deref(),
        own_username.as_deref(),
    )?;

    let channel = Channel::open(config.server_url.as_str());
    tracing::info!(url = channel.url(), "opening profile");

    let terminal = ratatui::init();
    let result = App::new(config, channel, session, &location)
        .run(terminal)
        .await;
    ratatui::restore();
    result
}
