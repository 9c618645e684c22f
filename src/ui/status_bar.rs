use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppMode};

/// Bottom status bar showing mode, the current path, paging hints and
/// status messages.
pub struct StatusBar<'a> {
    pub app: &'a App,
}

impl<'a> StatusBar<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        // Background
        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf[(x, area.y)].set_style(bg_style);
        }

        let mut spans = Vec::new();

        // Mode indicator
        let (mode_str, mode_bg) = match self.app.mode {
            AppMode::Normal => (" NORMAL ", Color::Blue),
            AppMode::Command => (" COMMAND ", Color::Magenta),
        };
        spans.push(Span::styled(
            mode_str,
            Style::default()
                .bg(mode_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));

        let profile = &self.app.profile;
        spans.push(Span::styled(profile.location(), bg_style));

        // Paging hints
        let hint_style = Style::default().bg(Color::DarkGray).fg(Color::Gray);
        if profile.has_prev_page() {
            spans.push(Span::styled("  [p] prev", hint_style));
        }
        spans.push(Span::styled("  [n] next", hint_style));
        if self.app.history.len() > 1 {
            spans.push(Span::styled("  [b] back", hint_style));
        }

        if profile.loading || profile.settings_loading {
            spans.push(Span::styled(
                " [loading...]",
                Style::default().bg(Color::DarkGray).fg(Color::Yellow),
            ));
        }

        // Status message (right-aligned)
        if let Some(ref msg) = self.app.status_message {
            let left_width: usize = spans.iter().map(|s| s.width()).sum();
            let msg = truncate_to_width(msg, area.width as usize);
            let padding = (area.width as usize).saturating_sub(left_width + msg.width());
            if padding > 0 {
                spans.push(Span::styled(" ".repeat(padding), bg_style));
            }
            spans.push(Span::styled(
                msg,
                Style::default().bg(Color::DarkGray).fg(Color::Yellow),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

/// Longest prefix of `s` that fits in `max` columns.
fn truncate_to_width(s: &str, max: usize) -> &str {
    let mut width = 0;
    for (idx, ch) in s.char_indices() {
        width += unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width > max {
            return &s[..idx];
        }
    }
    s
}
