use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

/// Help overlay showing keybindings.
#[derive(Default)]
pub struct HelpView;

impl HelpView {
    pub fn new() -> Self {
        Self
    }
}

impl Widget for HelpView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = 60u16.min(area.width.saturating_sub(4));
        let height = 28u16.min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let panel = Rect::new(x, y, width, height);

        Clear.render(panel, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Help - Keybindings ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(panel);
        block.render(panel, buf);

        let key_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(Color::White);
        let section_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let bindings: Vec<Line<'_>> = vec![
            Line::from(Span::styled("Feed", section_style)),
            binding_line("j/Down", "Move down", key_style, desc_style),
            binding_line("k/Up", "Move up", key_style, desc_style),
            binding_line("o/Enter", "Open selected item in browser", key_style, desc_style),
            binding_line("n / p", "Next / previous page", key_style, desc_style),
            binding_line("v", "Cycle view (overview, comments, ...)", key_style, desc_style),
            binding_line("s", "Cycle sort (new, top day, ...)", key_style, desc_style),
            binding_line("b/Bksp", "Back", key_style, desc_style),
            Line::from(""),
            Line::from(Span::styled("Settings (own profile)", section_style)),
            binding_line("x", "Toggle show NSFW", key_style, desc_style),
            binding_line("S", "Save settings", key_style, desc_style),
            Line::from(""),
            Line::from(Span::styled("Commands", section_style)),
            binding_line(":user NAME", "Open a profile", key_style, desc_style),
            binding_line(":open PATH", "Open a profile path or URL", key_style, desc_style),
            binding_line(":view KW", "overview|comments|posts|saved", key_style, desc_style),
            binding_line(":sort KW", "new|topday|topweek|...|topall", key_style, desc_style),
            binding_line(":page N", "Jump to page", key_style, desc_style),
            binding_line("@", "Shortcut for :user", key_style, desc_style),
            Line::from(""),
            binding_line("?", "This help screen", key_style, desc_style),
            binding_line("Esc/Enter", "Dismiss error popup", key_style, desc_style),
            binding_line("q/Ctrl-C", "Quit", key_style, desc_style),
        ];

        Paragraph::new(bindings).render(inner, buf);
    }
}

fn binding_line<'a>(key: &'a str, desc: &'a str, key_style: Style, desc_style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {key:<12}"), key_style),
        Span::styled(desc, desc_style),
    ])
}
