use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

use crate::api::types::CommunityUser;
use crate::profile::ProfileView;
use crate::ui::card::{format_count, parse_timestamp};

/// Sidebar with the user's stats, settings (own profile only), moderated
/// and followed communities.
pub struct ProfileSidebar<'a> {
    pub profile: &'a ProfileView,
}

impl<'a> ProfileSidebar<'a> {
    pub fn new(profile: &'a ProfileView) -> Self {
        Self { profile }
    }
}

impl Widget for ProfileSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let user = &self.profile.user;
        let title = if user.name.is_empty() {
            " Profile ".to_string()
        } else {
            format!(" /u/{} ", user.name)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        block.render(area, buf);

        if self.profile.loading {
            buf.set_string(
                inner.x + 1,
                inner.y,
                "Loading...",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let value = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        let label = Style::default().fg(Color::DarkGray);
        let section = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![Line::from(Span::styled(user.name.as_str(), value))];
        if !user.fedi_name.is_empty() {
            lines.push(Line::from(Span::styled(user.fedi_name.as_str(), label)));
        }
        if user.banned {
            lines.push(Line::from(Span::styled(
                "banned",
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(format_count(user.number_of_posts), value),
            Span::styled(" posts  ", label),
            Span::styled(format_count(user.post_score), value),
            Span::styled(" points", label),
        ]));
        lines.push(Line::from(vec![
            Span::styled(format_count(user.number_of_comments), value),
            Span::styled(" comments  ", label),
            Span::styled(format_count(user.comment_score), value),
            Span::styled(" points", label),
        ]));
        if let Some(joined) = parse_timestamp(&user.published) {
            lines.push(Line::from(Span::styled(
                format!("Joined {}", joined.format("%B %Y")),
                label,
            )));
        }

        if self.profile.is_current_user() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Settings", section)));
            let checkbox = if self.profile.settings.show_nsfw {
                "[x]"
            } else {
                "[ ]"
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{checkbox} "), value),
                Span::raw("Show NSFW"),
                Span::styled("  (x)", label),
            ]));
            let save = if self.profile.settings_loading {
                Span::styled("Saving...", Style::default().fg(Color::Yellow))
            } else {
                Span::styled("S to save", label)
            };
            lines.push(Line::from(save));
        }

        push_communities(&mut lines, "Moderates", &self.profile.moderates, section);
        push_communities(&mut lines, "Subscribed", &self.profile.follows, section);

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

fn push_communities<'a>(
    lines: &mut Vec<Line<'a>>,
    heading: &'a str,
    communities: &'a [CommunityUser],
    section: Style,
) {
    if communities.is_empty() {
        return;
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(heading, section)));
    for community in communities {
        lines.push(Line::from(format!("  !{}", community.community_name)));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::profile::tests::view_for;
    use crate::session::LocalSession;
    use crate::session::tests::token_for;

    fn rendered(profile: &ProfileView) -> String {
        let area = Rect::new(0, 0, 36, 20);
        let mut buf = Buffer::empty(area);
        ProfileSidebar::new(profile).render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn settings_only_on_own_profile() {
        let session = Arc::new(LocalSession::in_memory(&token_for(5, "alice", false)).unwrap());
        let mut own = view_for("/u/alice", session.clone());
        own.loading = false;
        own.user.id = 5;
        own.user.name = "alice".into();
        assert!(rendered(&own).contains("Show NSFW"));

        let mut other = view_for("/u/bob", session);
        other.loading = false;
        other.user.id = 6;
        other.user.name = "bob".into();
        assert!(!rendered(&other).contains("Show NSFW"));
    }

    #[test]
    fn lists_moderated_communities() {
        let mut view = crate::profile::tests::anonymous("/u/alice");
        view.loading = false;
        view.user.name = "alice".into();
        view.moderates.push(CommunityUser {
            community_name: "rust".into(),
            ..Default::default()
        });
        let text = rendered(&view);
        assert!(text.contains("Moderates"));
        assert!(text.contains("!rust"));
    }
}
