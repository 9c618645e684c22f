use crate::view_state::{LocationParams, SortType, ViewMode};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    User(String),
    Open(String),
    View(ViewMode),
    Sort(SortType),
    Page(i64),
    Back,
    Help,
    Quit,
}

pub fn parse_command(input: &str) -> Option<Command> {
    let input = input.strip_prefix(':').unwrap_or(input).trim();

    if input.is_empty() {
        return None;
    }

    let (cmd, args) = match input.split_once(char::is_whitespace) {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (input, ""),
    };

    match cmd {
        "user" | "u" if !args.is_empty() => Some(Command::User(strip_at(args).to_owned())),
        "open" | "o" if !args.is_empty() => Some(Command::Open(args.to_owned())),
        "view" | "v" => view_keyword(args).map(Command::View),
        "sort" | "s" => sort_keyword(args).map(Command::Sort),
        "page" | "p" => args.parse().ok().filter(|p| *p >= 1).map(Command::Page),
        "back" | "b" => Some(Command::Back),
        "help" | "h" => Some(Command::Help),
        "quit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

/// Exact keyword match. Unlike path parsing, a typo here is rejected rather
/// than silently defaulted.
fn view_keyword(arg: &str) -> Option<ViewMode> {
    ViewMode::ALL
        .into_iter()
        .find(|mode| mode.keyword().eq_ignore_ascii_case(arg))
}

fn sort_keyword(arg: &str) -> Option<SortType> {
    SortType::ALL
        .into_iter()
        .find(|sort| sort.keyword().eq_ignore_ascii_case(arg))
}

/// Resolve a profile path, a profile URL, or a bare username.
pub fn parse_location(input: &str) -> Option<LocationParams> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(params) = LocationParams::parse(trimmed) {
        return Some(params);
    }
    if trimmed.contains('/') || trimmed.contains(char::is_whitespace) {
        return None;
    }
    Some(LocationParams::for_user(strip_at(trimmed)))
}

pub fn strip_at(username: &str) -> &str {
    username.strip_prefix('@').unwrap_or(username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::Target;

    #[test]
    fn test_parse_command_user() {
        assert_eq!(
            parse_command(":user @alice"),
            Some(Command::User("alice".into()))
        );
        assert_eq!(parse_command("user bob"), Some(Command::User("bob".into())));
        assert_eq!(parse_command(":user"), None);
    }

    #[test]
    fn test_parse_command_open() {
        assert_eq!(
            parse_command(":open /u/alice/view/posts/sort/new/page/2"),
            Some(Command::Open("/u/alice/view/posts/sort/new/page/2".into()))
        );
    }

    #[test]
    fn test_parse_command_view_and_sort() {
        assert_eq!(parse_command(":view saved"), Some(Command::View(ViewMode::Saved)));
        assert_eq!(parse_command(":v Comments"), Some(Command::View(ViewMode::Comments)));
        assert_eq!(parse_command(":sort topweek"), Some(Command::Sort(SortType::TopWeek)));
        assert_eq!(parse_command(":view everything"), None);
        assert_eq!(parse_command(":sort"), None);
    }

    #[test]
    fn test_parse_command_page() {
        assert_eq!(parse_command(":page 3"), Some(Command::Page(3)));
        assert_eq!(parse_command(":page 0"), None);
        assert_eq!(parse_command(":page two"), None);
    }

    #[test]
    fn test_parse_command_aliases() {
        assert_eq!(parse_command(":q"), Some(Command::Quit));
        assert_eq!(parse_command(":h"), Some(Command::Help));
        assert_eq!(parse_command(":b"), Some(Command::Back));
        assert_eq!(parse_command(":u carol"), Some(Command::User("carol".into())));
    }

    #[test]
    fn test_parse_command_empty() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command(":"), None);
        assert_eq!(parse_command(":frobnicate"), None);
    }

    #[test]
    fn test_parse_location_username() {
        let params = parse_location("@alice").unwrap();
        assert_eq!(params.target, Target::Name("alice".into()));
        assert_eq!(params.page, None);
    }

    #[test]
    fn test_parse_location_path_and_url() {
        let params = parse_location("/u/bob/view/saved/sort/new/page/2").unwrap();
        assert_eq!(params.view.as_deref(), Some("saved"));

        let params = parse_location("https://lemmy.example/#/user/12/view/posts").unwrap();
        assert_eq!(params.target, Target::Id(12));
    }

    #[test]
    fn test_parse_location_rejects_other_routes() {
        assert_eq!(parse_location("/c/rust"), None);
        assert_eq!(parse_location("two words"), None);
        assert_eq!(parse_location("  "), None);
    }

    #[test]
    fn test_strip_at() {
        assert_eq!(strip_at("@alice"), "alice");
        assert_eq!(strip_at("bob"), "bob");
    }
}
