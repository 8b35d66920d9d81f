use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - attached to exactly one post.
///
/// `author_id` is None for anonymous/guest comments, and becomes None
/// again if the author account is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
}

impl Comment {
    /// Create a new comment, approved by default.
    pub fn new(post_id: Uuid, author_id: Option<Uuid>, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            body,
            created_at: Utc::now(),
            approved: true,
        }
    }
}

/// A comment with its author's display name resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author_name: Option<String>,
}
