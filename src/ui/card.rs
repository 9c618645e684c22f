use chrono::{DateTime, NaiveDateTime, Utc};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::types::{Comment, Post};
use crate::feed::FeedItem;

/// Renders one feed entry as a compact card.
///
/// Layout:
///   [post] !community · 2h ago [saved]
///   Title or comment text (may wrap) ...
///   ▲ 12  ▼ 3  score 9
pub struct ItemCard<'a> {
    pub item: FeedItem<'a>,
    pub show_nsfw: bool,
    pub selected: bool,
}

impl<'a> ItemCard<'a> {
    pub fn new(item: FeedItem<'a>, show_nsfw: bool) -> Self {
        Self {
            item,
            show_nsfw,
            selected: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for ItemCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let highlight_style = if self.selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let mut y = area.y;

        // -- Line 1: kind, where, when --
        let header = match self.item {
            FeedItem::Comment(c) => comment_header(c, highlight_style),
            FeedItem::Post(p) => post_header(p, highlight_style),
        };
        buf.set_line(area.x, y, &header, area.width);
        y += 1;

        if y >= area.y + area.height {
            return;
        }

        // -- Line 2+: body (wrapped) --
        let width = area.width as usize;
        let max_text_lines = (area.height - (y - area.y) - 1).max(1) as usize;
        let body_style = match self.item {
            FeedItem::Post(_) => Style::default().add_modifier(Modifier::BOLD),
            FeedItem::Comment(_) if self.selected => Style::default().fg(Color::White),
            FeedItem::Comment(_) => Style::default(),
        };

        for (i, line_text) in wrap_text(&body_text(&self.item, self.show_nsfw), width)
            .into_iter()
            .enumerate()
        {
            if i >= max_text_lines || y >= area.y + area.height {
                break;
            }
            buf.set_string(area.x, y, &line_text, body_style);
            y += 1;
        }

        if y >= area.y + area.height {
            return;
        }

        // -- Last line: votes --
        let (up, down, score, my_vote) = match self.item {
            FeedItem::Comment(c) => (c.upvotes, c.downvotes, c.score, c.my_vote),
            FeedItem::Post(p) => (p.upvotes, p.downvotes, p.score, p.my_vote),
        };
        let vote_style = |active: bool, color: Color| {
            let style = Style::default().fg(color);
            if active {
                style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                style
            }
        };
        let mut spans = vec![
            Span::styled(
                format!("\u{25B2} {}", format_count(up)),
                vote_style(my_vote == Some(1), Color::Green),
            ),
            Span::raw("  "),
            Span::styled(
                format!("\u{25BC} {}", format_count(down)),
                vote_style(my_vote == Some(-1), Color::Red),
            ),
            Span::raw("  "),
            Span::styled(
                format!("score {}", format_count(score)),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if let FeedItem::Post(p) = self.item {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("\u{1F4AC} {}", format_count(p.number_of_comments)),
                Style::default().fg(Color::Blue),
            ));
        }
        buf.set_line(area.x, y, &Line::from(spans), area.width);
    }
}

fn comment_header(c: &Comment, highlight: Style) -> Line<'_> {
    let mut spans = vec![Span::styled(
        "[comment]",
        highlight.add_modifier(Modifier::BOLD),
    )];
    if let Some(ref post) = c.post_name {
        spans.push(Span::styled(
            format!(" on {post}"),
            Style::default().fg(Color::White),
        ));
    }
    if let Some(ref community) = c.community_name {
        spans.push(Span::styled(
            format!(" !{community}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    push_time(&mut spans, &c.published, c.updated.is_some());
    push_flags(&mut spans, c.saved, c.deleted, c.removed);
    Line::from(spans)
}

fn post_header(p: &Post, highlight: Style) -> Line<'_> {
    let mut spans = vec![
        Span::styled("[post]", highlight.add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" !{}", p.community_name),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    push_time(&mut spans, &p.published, p.updated.is_some());
    if p.nsfw {
        spans.push(Span::styled(" [NSFW]", Style::default().fg(Color::Red)));
    }
    if p.locked {
        spans.push(Span::styled(" [locked]", Style::default().fg(Color::Yellow)));
    }
    push_flags(&mut spans, p.saved, p.deleted, p.removed);
    Line::from(spans)
}

fn push_time(spans: &mut Vec<Span<'_>>, published: &str, edited: bool) {
    if let Some(dt) = parse_timestamp(published) {
        spans.push(Span::styled(
            format!(" \u{00B7} {}", format_time_ago(dt, Utc::now())),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if edited {
        spans.push(Span::styled(" (edited)", Style::default().fg(Color::DarkGray)));
    }
}

fn push_flags(spans: &mut Vec<Span<'_>>, saved: Option<bool>, deleted: bool, removed: bool) {
    if saved == Some(true) {
        spans.push(Span::styled(" [saved]", Style::default().fg(Color::Yellow)));
    }
    if deleted {
        spans.push(Span::styled(" [deleted]", Style::default().fg(Color::Red)));
    }
    if removed {
        spans.push(Span::styled(" [removed]", Style::default().fg(Color::Red)));
    }
}

fn body_text(item: &FeedItem<'_>, show_nsfw: bool) -> String {
    match item {
        FeedItem::Comment(c) if c.removed => "*removed*".into(),
        FeedItem::Comment(c) if c.deleted => "*deleted*".into(),
        FeedItem::Comment(c) => c.content.clone(),
        FeedItem::Post(p) if p.nsfw && !show_nsfw => "NSFW post hidden by your settings".into(),
        FeedItem::Post(p) => match p.url.as_deref() {
            Some(url) if !url.is_empty() => format!("{}\n{url}", p.name),
            _ => p.name.clone(),
        },
    }
}

/// Height in lines needed for a card.
pub fn card_height(item: &FeedItem<'_>, width: u16, show_nsfw: bool) -> u16 {
    let text_lines = wrap_text(&body_text(item, show_nsfw), width as usize).len() as u16;
    // header + text + votes
    1 + text_lines + 1
}

/// Greedy word wrap by display width. Words wider than the line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_width = 0;
        for word in paragraph.split_whitespace() {
            let word_width = word.width();
            if current.is_empty() && word_width > width {
                for piece in split_wide(word, width) {
                    lines.push(piece);
                }
                continue;
            }
            if current.is_empty() {
                current = word.to_string();
                current_width = word_width;
            } else if current_width + 1 + word_width <= width {
                current.push(' ');
                current.push_str(word);
                current_width += 1 + word_width;
            } else {
                lines.push(std::mem::take(&mut current));
                if word_width > width {
                    lines.extend(split_wide(word, width));
                    current_width = 0;
                } else {
                    current = word.to_string();
                    current_width = word_width;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_wide(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for ch in word.chars() {
        let w = ch.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Server timestamps are naive UTC (`2019-04-20T17:22:34.123456`); RFC 3339
/// is accepted too.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)))
        .ok()
}

fn format_time_ago(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(dt);

    if diff.num_seconds() < 60 {
        format!("{}s", diff.num_seconds().max(0))
    } else if diff.num_minutes() < 60 {
        format!("{}m", diff.num_minutes())
    } else if diff.num_hours() < 24 {
        format!("{}h", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d", diff.num_days())
    } else {
        dt.format("%b %d %Y").to_string()
    }
}

pub fn format_count(n: i64) -> String {
    let abs = n.unsigned_abs();
    let sign = if n < 0 { "-" } else { "" };
    if abs >= 1_000_000 {
        format!("{sign}{:.1}M", abs as f64 / 1_000_000.0)
    } else if abs >= 1_000 {
        format!("{sign}{:.1}K", abs as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn keeps_blank_lines_between_paragraphs() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn splits_words_wider_than_line() {
        assert_eq!(wrap_text("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn measures_wide_characters_by_display_width() {
        // Each CJK character is two columns wide.
        assert_eq!(wrap_text("日本語 です", 6), vec!["日本語", "です"]);
    }

    #[test]
    fn parses_server_timestamps() {
        let dt = parse_timestamp("2019-04-20T17:22:34.123456").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2019-04-20 17:22");
        assert!(parse_timestamp("2019-04-20T17:22:34Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn time_ago_buckets() {
        let now = Utc.with_ymd_and_hms(2019, 5, 1, 12, 0, 0).unwrap();
        let ago = |secs| format_time_ago(now - chrono::Duration::seconds(secs), now);
        assert_eq!(ago(5), "5s");
        assert_eq!(ago(120), "2m");
        assert_eq!(ago(3 * 3600), "3h");
        assert_eq!(ago(2 * 86_400), "2d");
        assert_eq!(ago(90 * 86_400), "Jan 31 2019");
    }

    #[test]
    fn counts_abbreviate_and_keep_sign() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(-2_000_000), "-2.0M");
        assert_eq!(format_count(-3), "-3");
    }

    #[test]
    fn hidden_nsfw_post_shows_placeholder() {
        let post = Post {
            id: 1,
            name: "title".into(),
            nsfw: true,
            ..Default::default()
        };
        let item = FeedItem::Post(&post);
        assert_eq!(body_text(&item, false), "NSFW post hidden by your settings");
        assert_eq!(body_text(&item, true), "title");
    }
}
