use serde::{Deserialize, Serialize};

use crate::view_state::SortType;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Public profile of a user with aggregate counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fedi_name: String,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub number_of_posts: i64,
    #[serde(default)]
    pub post_score: i64,
    #[serde(default)]
    pub number_of_comments: i64,
    #[serde(default)]
    pub comment_score: i64,
    #[serde(default)]
    pub banned: bool,
}

/// A follow or moderator relationship between a user and a community.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityUser {
    #[serde(default)]
    pub id: i32,
    pub community_id: i32,
    #[serde(default)]
    pub user_id: i32,
    #[serde(default)]
    pub user_name: String,
    pub community_name: String,
    #[serde(default)]
    pub published: String,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    #[serde(default)]
    pub creator_id: i32,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub post_id: i32,
    #[serde(default)]
    pub post_name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub community_id: i32,
    #[serde(default)]
    pub community_name: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    /// `Some(1)` up, `Some(-1)` down, `Some(0)` or `None` no vote.
    #[serde(default)]
    pub my_vote: Option<i16>,
    #[serde(default)]
    pub saved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub creator_id: i32,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub community_id: i32,
    #[serde(default)]
    pub community_name: String,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub number_of_comments: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub my_vote: Option<i16>,
    #[serde(default)]
    pub saved: Option<bool>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetUserDetailsForm {
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub sort: SortType,
    pub saved_only: bool,
    pub page: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSettingsForm {
    pub show_nsfw: bool,
    pub auth: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDetailsResponse {
    pub user: UserView,
    #[serde(default)]
    pub follows: Vec<CommunityUser>,
    #[serde(default)]
    pub moderates: Vec<CommunityUser>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub comment: Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub jwt: String,
}
