use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Category;

/// Post entity - a blog article.
///
/// The slug is assigned once at creation and never changes. `view_count`
/// only moves forward and is written by the server alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub category_id: Option<Uuid>,
    pub content: String,
    /// Opaque reference into the external media store.
    pub image_ref: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub view_count: i64,
}

impl Post {
    /// Create a new unpublished post with generated ID and timestamps.
    pub fn new(
        author_id: Uuid,
        title: String,
        slug: String,
        content: String,
        category_id: Option<Uuid>,
        image_ref: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            slug,
            category_id,
            content,
            image_ref,
            published: false,
            created_at: now,
            updated_at: now,
            view_count: 0,
        }
    }
}

/// A post enriched with the relations a reader sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: Post,
    pub author_name: String,
    pub category: Option<Category>,
    pub likes_count: u64,
    pub liked_by_viewer: bool,
    pub comments_count: u64,
}
