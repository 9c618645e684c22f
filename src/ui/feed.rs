use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Widget};

use crate::feed::FeedItem;
use crate::ui::card::{ItemCard, card_height};

/// A scrollable list of feed entries with selection highlight.
pub struct FeedView<'a> {
    pub title: String,
    pub items: &'a [FeedItem<'a>],
    pub selected_index: usize,
    pub show_nsfw: bool,
    pub loading: bool,
}

impl<'a> FeedView<'a> {
    pub fn new(title: String, items: &'a [FeedItem<'a>], selected_index: usize) -> Self {
        Self {
            title,
            items,
            selected_index,
            show_nsfw: false,
            loading: false,
        }
    }

    pub fn show_nsfw(mut self, show_nsfw: bool) -> Self {
        self.show_nsfw = show_nsfw;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

impl Widget for FeedView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        block.render(area, buf);

        if self.items.is_empty() {
            let msg = if self.loading {
                "Loading..."
            } else {
                "Nothing here yet"
            };
            buf.set_string(
                inner.x + 1,
                inner.y,
                msg,
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let content_width = inner.width.saturating_sub(1); // 1 char left margin
        let available_height = inner.height;

        // Card heights including the separator line.
        let heights: Vec<u16> = self
            .items
            .iter()
            .map(|item| card_height(item, content_width, self.show_nsfw) + 1)
            .collect();

        let scroll_start = compute_scroll_start(&heights, self.selected_index, available_height);

        let mut y = inner.y;
        let mut idx = scroll_start;
        while idx < self.items.len() && y < inner.y + inner.height {
            let card_h = heights[idx];
            let remaining = inner.y + inner.height - y;
            let render_h = card_h.min(remaining);

            let card_area = Rect::new(inner.x + 1, y, content_width, render_h.saturating_sub(1));
            ItemCard::new(self.items[idx], self.show_nsfw)
                .selected(idx == self.selected_index)
                .render(card_area, buf);

            y += render_h;

            if y < inner.y + inner.height && idx + 1 < self.items.len() {
                let sep = "\u{2500}".repeat(content_width as usize);
                buf.set_string(
                    inner.x + 1,
                    y.saturating_sub(1),
                    &sep,
                    Style::default().fg(Color::DarkGray),
                );
            }

            idx += 1;
        }
    }
}

/// Find the smallest scroll start index so that the selected item fits
/// within the available height.
fn compute_scroll_start(heights: &[u16], selected: usize, available: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }

    let selected = selected.min(heights.len() - 1);
    if available == 0 {
        return selected;
    }

    // Always include the selected card and pack as many earlier cards as
    // fit above it.
    let mut start = selected;
    let mut used = heights[selected];

    while start > 0 {
        let next = used.saturating_add(heights[start - 1]);
        if next > available {
            break;
        }
        start -= 1;
        used = next;
    }

    start
}

#[cfg(test)]
mod tests {
    use ratatui::buffer::Buffer;

    use super::*;
    use crate::api::types::{Comment, Post};

    #[test]
    fn handles_empty_feed() {
        assert_eq!(compute_scroll_start(&[], 0, 10), 0);
    }

    #[test]
    fn advances_when_selected_is_below_exactly_full_window() {
        let heights = [5, 5, 5];
        assert_eq!(compute_scroll_start(&heights, 2, 10), 1);
    }

    #[test]
    fn keeps_selected_item_visible_when_it_is_taller_than_viewport() {
        let heights = [3, 12, 4];
        assert_eq!(compute_scroll_start(&heights, 1, 8), 1);
    }

    #[test]
    fn clamps_selected_index_to_last_item() {
        let heights = [2, 2, 2];
        assert_eq!(compute_scroll_start(&heights, 99, 4), 1);
    }

    fn rendered(view: FeedView<'_>, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn empty_feed_shows_loading_state() {
        let text = rendered(FeedView::new("Overview".into(), &[], 0).loading(true), 30, 5);
        assert!(text.contains("Loading..."));
        assert!(text.contains("Overview"));
    }

    #[test]
    fn renders_comments_and_posts() {
        let comment = Comment {
            id: 1,
            content: "first!".into(),
            ..Default::default()
        };
        let post = Post {
            id: 2,
            name: "A title".into(),
            community_name: "rust".into(),
            ..Default::default()
        };
        let items = [FeedItem::Comment(&comment), FeedItem::Post(&post)];
        let text = rendered(FeedView::new("Overview".into(), &items, 1), 40, 12);
        assert!(text.contains("first!"));
        assert!(text.contains("A title"));
        assert!(text.contains("!rust"));
    }
}
