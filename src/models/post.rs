//! Post, comment, and like models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    /// Opaque media URL reference; upload handling lives elsewhere
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment entity.
///
/// Author and post are fixed at creation; only the content is editable,
/// and only by the author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Like entity; at most one per (user, post) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A post decorated for display: its author and the derived fields.
///
/// The counts and the viewer flag are computed by the query that loads the
/// post, never stored on the posts table.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithMeta {
    pub post: Post,
    pub author: User,
    pub likes_count: i64,
    pub comments_count: i64,
    pub liked_by_viewer: bool,
}

/// A comment joined with its author for display
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: User,
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub content: String,
    pub media_url: Option<String>,
}

/// Input for updating a post
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub content: Option<String>,
    pub media_url: Option<String>,
}

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
}
