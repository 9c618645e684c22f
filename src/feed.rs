//! Merges a profile's comments and posts into one feed.

use serde::Serialize;
use url::Url;

use crate::api::types::{Comment, Post};
use crate::view_state::{SortType, ViewMode};

/// A feed entry tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type_", content = "data", rename_all = "lowercase")]
pub enum FeedItem<'a> {
    Comment(&'a Comment),
    Post(&'a Post),
}

impl FeedItem<'_> {
    pub fn id(&self) -> i32 {
        match self {
            FeedItem::Comment(c) => c.id,
            FeedItem::Post(p) => p.id,
        }
    }

    pub fn published(&self) -> &str {
        match self {
            FeedItem::Comment(c) => &c.published,
            FeedItem::Post(p) => &p.published,
        }
    }

    pub fn score(&self) -> i64 {
        match self {
            FeedItem::Comment(c) => c.score,
            FeedItem::Post(p) => p.score,
        }
    }

    /// Where "open" takes the user: a post's external link if it has one,
    /// otherwise its page on the web UI.
    pub fn link(&self, web_base: &Url) -> String {
        match self {
            FeedItem::Post(p) => match p.url.as_deref() {
                Some(url) if !url.trim().is_empty() => url.to_owned(),
                _ => format!("{web_base}#/post/{}", p.id),
            },
            FeedItem::Comment(c) => format!("{web_base}#/post/{}/comment/{}", c.post_id, c.id),
        }
    }
}

/// Concatenate comments and posts and sort descending: by publish
/// timestamp (string comparison of the ISO-8601 text) for `New`, by score
/// for every `Top*` sort. Order among equal keys is unspecified.
pub fn merge<'a>(comments: &'a [Comment], posts: &'a [Post], sort: SortType) -> Vec<FeedItem<'a>> {
    let mut combined: Vec<FeedItem<'a>> = comments
        .iter()
        .map(FeedItem::Comment)
        .chain(posts.iter().map(FeedItem::Post))
        .collect();

    if sort == SortType::New {
        combined.sort_unstable_by(|a, b| b.published().cmp(a.published()));
    } else {
        combined.sort_unstable_by_key(|item| std::cmp::Reverse(item.score()));
    }
    combined
}

/// The items a view mode displays. Overview and Saved show the merged feed;
/// Comments and Posts show one collection in server order.
pub fn items_for_view<'a>(
    view: ViewMode,
    comments: &'a [Comment],
    posts: &'a [Post],
    sort: SortType,
) -> Vec<FeedItem<'a>> {
    match view {
        ViewMode::Overview | ViewMode::Saved => merge(comments, posts, sort),
        ViewMode::Comments => comments.iter().map(FeedItem::Comment).collect(),
        ViewMode::Posts => posts.iter().map(FeedItem::Post).collect(),
    }
}
