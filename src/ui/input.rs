use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthChar;

/// A simple single-line text input renderer.
///
/// Renders the prompt + text content, with a cursor indicator at the end.
pub struct TextInput<'a> {
    pub prompt: &'a str,
    pub text: &'a str,
    pub style: Style,
}

impl<'a> TextInput<'a> {
    pub fn new(prompt: &'a str, text: &'a str) -> Self {
        Self {
            prompt,
            text,
            style: Style::default().fg(Color::White),
        }
    }
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let display = format!("{}{}\u{2588}", self.prompt, self.text);
        buf.set_string(
            area.x,
            area.y,
            visible_tail(&display, area.width as usize),
            self.style,
        );
    }
}

/// If the text is wider than the area, keep the rightmost columns so the
/// cursor stays in view.
fn visible_tail(display: &str, max_width: usize) -> &str {
    let mut width = 0;
    for (idx, ch) in display.char_indices().rev() {
        width += ch.width().unwrap_or(0);
        if width > max_width {
            return &display[idx + ch.len_utf8()..];
        }
    }
    display
}
