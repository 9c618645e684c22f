//! View/sort/page state and its navigation-path codec.
//!
//! Paths look like `/u/{username}/view/{view}/sort/{sort}/page/{page}` (or
//! `/user/{id}/...`). Every keyword table here is explicit in both
//! directions; unrecognized input falls back to a default and never fails.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Characters escaped when a username is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`');

// ---------------------------------------------------------------------------
// View mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    #[default]
    Overview,
    Comments,
    Posts,
    Saved,
}

const VIEW_KEYWORDS: [(ViewMode, &str); 4] = [
    (ViewMode::Overview, "overview"),
    (ViewMode::Comments, "comments"),
    (ViewMode::Posts, "posts"),
    (ViewMode::Saved, "saved"),
];

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Overview,
        ViewMode::Comments,
        ViewMode::Posts,
        ViewMode::Saved,
    ];

    pub fn keyword(self) -> &'static str {
        VIEW_KEYWORDS
            .iter()
            .find(|(mode, _)| *mode == self)
            .map_or("overview", |(_, kw)| *kw)
    }

    /// Case-insensitive lookup; anything unknown is [`ViewMode::Overview`].
    pub fn from_keyword(keyword: &str) -> Self {
        VIEW_KEYWORDS
            .iter()
            .find(|(_, kw)| kw.eq_ignore_ascii_case(keyword.trim()))
            .map_or_else(Self::default, |(mode, _)| *mode)
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Overview => "Overview",
            ViewMode::Comments => "Comments",
            ViewMode::Posts => "Posts",
            ViewMode::Saved => "Saved",
        }
    }

    /// The next mode in selector order, wrapping around.
    pub fn cycle(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

// ---------------------------------------------------------------------------
// Sort mode
// ---------------------------------------------------------------------------

/// Sort order for a profile's content. Serialized with the variant name,
/// which is what the server expects in `GetUserDetails.sort`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortType {
    #[default]
    New,
    TopDay,
    TopWeek,
    TopMonth,
    TopYear,
    TopAll,
}

const SORT_KEYWORDS: [(SortType, &str); 6] = [
    (SortType::New, "new"),
    (SortType::TopDay, "topday"),
    (SortType::TopWeek, "topweek"),
    (SortType::TopMonth, "topmonth"),
    (SortType::TopYear, "topyear"),
    (SortType::TopAll, "topall"),
];

impl SortType {
    pub const ALL: [SortType; 6] = [
        SortType::New,
        SortType::TopDay,
        SortType::TopWeek,
        SortType::TopMonth,
        SortType::TopYear,
        SortType::TopAll,
    ];

    pub fn keyword(self) -> &'static str {
        SORT_KEYWORDS
            .iter()
            .find(|(sort, _)| *sort == self)
            .map_or("new", |(_, kw)| *kw)
    }

    /// Case-insensitive lookup; anything unknown is [`SortType::New`].
    pub fn from_keyword(keyword: &str) -> Self {
        SORT_KEYWORDS
            .iter()
            .find(|(_, kw)| kw.eq_ignore_ascii_case(keyword.trim()))
            .map_or_else(Self::default, |(sort, _)| *sort)
    }

    pub fn label(self) -> &'static str {
        match self {
            SortType::New => "New",
            SortType::TopDay => "Top Day",
            SortType::TopWeek => "Week",
            SortType::TopMonth => "Month",
            SortType::TopYear => "Year",
            SortType::TopAll => "All",
        }
    }

    pub fn cycle(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

// ---------------------------------------------------------------------------
// Target user & location params
// ---------------------------------------------------------------------------

/// Whose profile is being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(i32),
    Name(String),
}

/// Raw parameters pulled out of a navigation path, before defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParams {
    pub target: Target,
    pub view: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl LocationParams {
    pub fn for_user(username: &str) -> Self {
        Self {
            target: Target::Name(username.to_owned()),
            view: None,
            sort: None,
            page: None,
        }
    }

    /// Parse a profile path (or a full URL / hash route pointing at one).
    ///
    /// Returns `None` for anything that is not a `/u/...` or `/user/...`
    /// route. Unknown trailing keys are ignored.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let path = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).ok()?;
            match url.fragment() {
                Some(fragment) if fragment.starts_with('/') => fragment.to_owned(),
                _ => url.path().to_owned(),
            }
        } else {
            trimmed.trim_start_matches('#').to_owned()
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (kind, ident, rest) = match segments.as_slice() {
            [kind, ident, rest @ ..] => (*kind, *ident, rest),
            _ => return None,
        };

        let target = match kind {
            "u" => Target::Name(percent_decode_str(ident).decode_utf8().ok()?.into_owned()),
            "user" => Target::Id(ident.parse().ok()?),
            _ => return None,
        };

        let mut params = Self {
            target,
            view: None,
            sort: None,
            page: None,
        };
        for pair in rest.chunks(2) {
            if let [key, value] = pair {
                match *key {
                    "view" => params.view = Some((*value).to_owned()),
                    "sort" => params.sort = Some((*value).to_owned()),
                    "page" => params.page = Some((*value).to_owned()),
                    _ => {}
                }
            }
        }
        Some(params)
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub view: ViewMode,
    pub sort: SortType,
    /// One-based. Not floored here: a programmatic `prev_page` from 1 can
    /// produce 0, which the server has to reject or clamp.
    pub page: i64,
    pub target: Target,
}

impl ViewState {
    pub fn from_location(params: &LocationParams) -> Self {
        let page = params
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        Self {
            view: params
                .view
                .as_deref()
                .map_or_else(ViewMode::default, ViewMode::from_keyword),
            sort: params
                .sort
                .as_deref()
                .map_or_else(SortType::default, SortType::from_keyword),
            page,
            target: params.target.clone(),
        }
    }

    pub fn to_location(&self) -> String {
        let prefix = match &self.target {
            Target::Name(name) => format!("/u/{}", utf8_percent_encode(name, SEGMENT)),
            Target::Id(id) => format!("/user/{id}"),
        };
        format!(
            "{prefix}/view/{}/sort/{}/page/{}",
            self.view.keyword(),
            self.sort.keyword(),
            self.page
        )
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// In-memory navigation history. The last entry is the current location.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new(initial: String) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    pub fn push(&mut self, path: String) {
        if self.entries.last() != Some(&path) {
            self.entries.push(path);
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Pop the current entry and return the one before it. The first entry
    /// is never popped.
    pub fn back(&mut self) -> Option<&str> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.pop();
        self.current()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
