use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

/// Modal popup for errors reported by the server. Server errors arrive as
/// snake_case keys (`couldnt_find_that_username_or_email`) and are shown
/// as a sentence.
pub struct ErrorPopup<'a> {
    text: &'a str,
}

impl<'a> ErrorPopup<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }
}

/// `couldnt_find_that_username_or_email` -> `Couldnt find that username or
/// email`. Anything that isn't a bare key is returned unchanged.
pub fn humanize(message: &str) -> String {
    let is_key = !message.is_empty()
        && message
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !is_key {
        return message.to_owned();
    }
    let spaced = message.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => spaced,
    }
}

impl Widget for ErrorPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = humanize(self.text);
        let max_width = 60u16.min(area.width.saturating_sub(4));
        let inner_width = max_width.saturating_sub(2) as usize;

        let text_lines: usize = text
            .lines()
            .map(|line| {
                if line.is_empty() || inner_width == 0 {
                    1
                } else {
                    line.width().div_ceil(inner_width)
                }
            })
            .sum();

        // Border plus a blank line and the dismiss hint.
        let content_height = (text_lines as u16) + 4;
        let height = content_height
            .min((area.height * 3 / 5).max(8))
            .min(area.height.saturating_sub(2));

        let x = area.x + (area.width.saturating_sub(max_width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let panel = Rect::new(x, y, max_width, height);

        Clear.render(panel, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Error ")
            .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .border_style(Style::default().fg(Color::Red));

        let inner = block.inner(panel);
        block.render(panel, buf);

        if inner.height < 2 {
            return;
        }
        let text_area = Rect::new(inner.x, inner.y, inner.width, inner.height - 1);
        let hint_area = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);

        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .render(text_area, buf);

        let hint = Line::from(Span::styled(
            " Esc or Enter to dismiss ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ));
        Paragraph::new(hint).render(hint_area, buf);
    }
}
