pub mod card;
pub mod command_bar;
pub mod error_popup;
pub mod feed;
pub mod help;
pub mod input;
pub mod profile;
pub mod status_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::app::{App, AppMode};

use command_bar::CommandBar;
use error_popup::ErrorPopup;
use feed::FeedView;
use help::HelpView;
use profile::ProfileSidebar;
use status_bar::StatusBar;

/// Width of the profile sidebar when the terminal is wide enough for it.
const SIDEBAR_WIDTH: u16 = 36;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: main content + status bar + optional command bar
    let bottom_height = if app.mode != AppMode::Normal { 2 } else { 1 };

    let [main_area, bottom_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(bottom_height)]).areas(area);

    if app.mode != AppMode::Normal {
        let [status_area, cmd_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(bottom_area);
        frame.render_widget(StatusBar::new(app), status_area);
        frame.render_widget(CommandBar::new(app), cmd_area);
    } else {
        frame.render_widget(StatusBar::new(app), bottom_area);
    }

    let profile = &app.profile;
    let items = profile.feed();
    let title = format!(
        "{} \u{00B7} {}",
        profile.view_state.view.label(),
        profile.view_state.sort.label()
    );
    let feed = FeedView::new(title, &items, app.selected_index)
        .show_nsfw(profile.settings.show_nsfw)
        .loading(profile.loading);

    if main_area.width >= SIDEBAR_WIDTH * 2 {
        let [feed_area, sidebar_area] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(SIDEBAR_WIDTH)])
                .areas(main_area);
        frame.render_widget(feed, feed_area);
        frame.render_widget(ProfileSidebar::new(profile), sidebar_area);
    } else {
        frame.render_widget(feed, main_area);
    }

    if app.show_help {
        frame.render_widget(HelpView::new(), main_area);
    }

    // Error popup overlay (renders on top of everything)
    if let Some(ref detail) = app.error_detail {
        frame.render_widget(ErrorPopup::new(detail), frame.area());
    }
}
