use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::api::types::Post;
use crate::channel::Channel;
use crate::command::{self, Command};
use crate::config::AppConfig;
use crate::event::{AppEvent, Event, EventHandler};
use crate::feed::FeedItem;
use crate::profile::{Effect, ProfileOptions, ProfileView};
use crate::session::SessionStore;
use crate::subscription::{RetryPolicy, Subscription};
use crate::ui;
use crate::view_state::{History, LocationParams};

// ---------------------------------------------------------------------------
// App mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Command,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: AppConfig,
    pub mode: AppMode,
    pub show_help: bool,

    // Profile being viewed and how we got here
    pub profile: ProfileView,
    pub history: History,

    // Transport
    channel: Channel,
    subscription: Option<Subscription>,

    // Input state
    pub command_input: String,
    pub selected_index: usize,

    // Status
    pub status_message: Option<String>,
    pub error_detail: Option<String>,
}

impl App {
    pub fn new(
        config: AppConfig,
        channel: Channel,
        session: Arc<dyn SessionStore>,
        location: &LocationParams,
    ) -> Self {
        let options = ProfileOptions {
            fetch_limit: config.fetch_limit,
            site_name: config.site_name.clone(),
        };
        let profile = ProfileView::new(location, session, options);
        let history = History::new(profile.location());

        Self {
            running: true,
            events: EventHandler::new(config.tick_rate_fps),
            config,
            mode: AppMode::Normal,
            show_help: false,
            profile,
            history,
            channel,
            subscription: None,
            command_input: String::new(),
            selected_index: 0,
            status_message: None,
            error_detail: None,
        }
    }

    // -- Main event loop ----------------------------------------------------

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.subscribe();
        let fetch = self.profile.refetch();
        self.apply(vec![fetch]);

        while self.running {
            terminal.draw(|frame| self.draw(frame))?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => {
                    if let crossterm::event::Event::Key(key) = event
                        && key.kind == crossterm::event::KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Event::App(app_event) => self.handle_app_event(*app_event),
            }
        }

        if let Some(subscription) = self.subscription.take() {
            let _ = subscription.unsubscribe().await;
        }
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        ui::draw(frame, self);
    }

    fn tick(&self) {}

    /// Attach to the channel. Each decoded message is queued as an app event
    /// so it is handled on this loop, in arrival order.
    fn subscribe(&mut self) {
        let sender = self.events.sender();
        let subscription = Subscription::spawn(
            Arc::new(self.channel.clone()),
            RetryPolicy::from_config(&self.config),
            move |envelope| {
                let _ = sender.send(Event::App(Box::new(AppEvent::Channel(envelope))));
            },
        );
        self.subscription = Some(subscription);
    }

    // -- Effects ------------------------------------------------------------

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send {
                    request,
                    request_id,
                } => {
                    if let Err(e) = self.channel.send(&request, request_id) {
                        tracing::warn!(op = request.op().tag(), "send failed: {e}");
                        self.error_detail = Some(e.to_string());
                    }
                }
                Effect::PushLocation(path) => {
                    self.history.push(path);
                }
                Effect::ShowError(message) => {
                    self.error_detail = Some(message);
                }
                Effect::Notice(message) => {
                    self.status_message = Some(message);
                }
                Effect::SetTitle(title) => {
                    if let Err(e) = crossterm::execute!(
                        std::io::stdout(),
                        crossterm::terminal::SetTitle(&title)
                    ) {
                        tracing::debug!("could not set terminal title: {e}");
                    }
                }
                Effect::ScrollToTop => {
                    self.selected_index = 0;
                }
            }
        }
    }

    // -- App events ---------------------------------------------------------

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => {
                self.running = false;
            }
            AppEvent::Navigate(input) => match command::parse_location(&input) {
                Some(location) => {
                    self.selected_index = 0;
                    let effects = self.profile.open(&location);
                    self.apply(effects);
                }
                None => {
                    self.status_message = Some(format!("Not a profile: {input}"));
                }
            },
            AppEvent::Back => self.go_back(),
            AppEvent::Channel(envelope) => {
                let effects = self.profile.handle_message(envelope);
                self.apply(effects);
                self.clamp_selection();
            }
        }
    }

    fn go_back(&mut self) {
        let Some(path) = self.history.back().map(str::to_owned) else {
            self.status_message = Some("No earlier page".to_string());
            return;
        };
        match LocationParams::parse(&path) {
            Some(location) => {
                self.selected_index = 0;
                let effects = self.profile.navigate_back(&location);
                self.apply(effects);
            }
            None => tracing::warn!(%path, "history entry is not a profile path"),
        }
    }

    // -- Key event routing --------------------------------------------------

    fn handle_key_event(&mut self, key: KeyEvent) {
        // Ctrl-C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c' | 'C'))
        {
            self.events.send(AppEvent::Quit);
            return;
        }

        // The error popup is modal.
        if self.error_detail.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_detail = None;
            }
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q' | '?')) {
                self.show_help = false;
            }
            return;
        }

        match self.mode {
            AppMode::Normal => self.handle_normal_key(key),
            AppMode::Command => self.handle_command_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.events.send(AppEvent::Quit);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_down();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection_up();
            }
            KeyCode::Char('n') => {
                self.selected_index = 0;
                let effects = self.profile.next_page();
                self.apply(effects);
            }
            KeyCode::Char('p') => {
                let effects = self.profile.page_back();
                if !effects.is_empty() {
                    self.selected_index = 0;
                }
                self.apply(effects);
            }
            KeyCode::Char('v') => {
                self.selected_index = 0;
                let effects = self.profile.set_view(self.profile.view_state.view.cycle());
                self.apply(effects);
            }
            KeyCode::Char('s') => {
                self.selected_index = 0;
                let effects = self.profile.set_sort(self.profile.view_state.sort.cycle());
                self.apply(effects);
            }
            KeyCode::Char('b') | KeyCode::Backspace => {
                self.events.send(AppEvent::Back);
            }
            KeyCode::Char('o') | KeyCode::Enter => {
                self.open_selected();
            }
            KeyCode::Char('x') if self.profile.is_current_user() => {
                self.profile.toggle_show_nsfw();
            }
            KeyCode::Char('S') if self.profile.is_current_user() => {
                let effects = self.profile.submit_settings();
                self.apply(effects);
            }
            KeyCode::Char(':') => {
                self.mode = AppMode::Command;
                self.command_input.clear();
            }
            KeyCode::Char('@') => {
                self.mode = AppMode::Command;
                self.command_input = "user ".to_string();
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                self.execute_command();
                self.mode = AppMode::Normal;
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(c) => {
                self.command_input.push(c);
            }
            _ => {}
        }
    }

    // -- Command execution --------------------------------------------------

    fn execute_command(&mut self) {
        let input = std::mem::take(&mut self.command_input);
        match command::parse_command(&input) {
            Some(Command::User(username)) | Some(Command::Open(username)) => {
                self.events.send(AppEvent::Navigate(username));
            }
            Some(Command::View(view)) => {
                self.selected_index = 0;
                let effects = self.profile.set_view(view);
                self.apply(effects);
            }
            Some(Command::Sort(sort)) => {
                self.selected_index = 0;
                let effects = self.profile.set_sort(sort);
                self.apply(effects);
            }
            Some(Command::Page(page)) => {
                self.selected_index = 0;
                let effects = self.profile.set_page(page);
                self.apply(effects);
            }
            Some(Command::Back) => {
                self.events.send(AppEvent::Back);
            }
            Some(Command::Help) => {
                self.show_help = true;
            }
            Some(Command::Quit) => {
                self.events.send(AppEvent::Quit);
            }
            None => {
                self.status_message = Some(format!("Unknown command: {input}"));
            }
        }
    }

    // -- Selection helpers --------------------------------------------------

    fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.profile.feed().len() {
            self.selected_index += 1;
        }
    }

    fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let count = self.profile.feed().len();
        self.selected_index = self.selected_index.min(count.saturating_sub(1));
    }

    fn open_selected(&mut self) {
        let feed = self.profile.feed();
        let Some(item) = feed.get(self.selected_index) else {
            return;
        };
        let Some(base) = self.config.web_base() else {
            self.status_message = Some("Cannot derive a web address from server_url".into());
            return;
        };
        let link = item.link(&base);
        tracing::debug!(id = item.id(), %link, "opening item");
        if let FeedItem::Post(Post { nsfw: true, .. }) = item
            && !self.profile.settings.show_nsfw
        {
            self.status_message = Some("NSFW post hidden by your settings".into());
            return;
        }
        if let Err(e) = open::that(&link) {
            self.status_message = Some(format!("Could not open {link}: {e}"));
        }
    }
}
