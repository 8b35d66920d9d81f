use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentView, Post, PostDetail, User};
use crate::error::RepoError;

/// One page of a listing plus the unpaginated total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Offset/limit window into a listing. Page-size policy lives in the
/// gateway; the services only see the resolved window.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

/// Sort order for post listings. The default is newest-first, stated
/// explicitly at the call site rather than baked into the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
    UpdatedAtDesc,
    UpdatedAtAsc,
    LikesDesc,
    LikesAsc,
}

/// Filter/search/ordering parameters for post listings.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub category_id: Option<Uuid>,
    pub published: Option<bool>,
    /// Free-text search over title, content, author username, category name.
    pub search: Option<String>,
    pub order: PostOrder,
    pub page: Pagination,
}

/// Outcome of a like toggle, read within the same transaction as the flip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub likes_count: u64,
}

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Category repository. The store enforces uniqueness of both name and
/// slug; deleting a category nulls the reference on its posts.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert(&self, category: Category) -> Result<Category, RepoError>;

    async fn update(&self, category: Category) -> Result<Category, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    async fn name_exists(&self, name: &str) -> Result<bool, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;

    async fn list(&self) -> Result<Vec<Category>, RepoError>;
}

/// Post repository. Insert surfaces `RepoError::Unique("slug")` when the
/// slug lost an allocation race; delete cascades comments and like rows.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: Post) -> Result<Post, RepoError>;

    async fn update(&self, post: Post) -> Result<Post, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Slug lookup enriched with author name, category, like and comment
    /// counts, and whether `viewer` has liked the post.
    async fn find_detail_by_slug(
        &self,
        slug: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<PostDetail>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;

    async fn list(
        &self,
        query: &PostQuery,
        viewer: Option<Uuid>,
    ) -> Result<Page<PostDetail>, RepoError>;

    /// Server-side monotonic bump of the view counter.
    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError>;

    /// Atomically flip `user_id`'s membership in the post's like set and
    /// return the resulting state and count.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus, RepoError>;

    async fn is_liked(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError>;

    /// Approved comments for a post, newest first.
    async fn list_approved(
        &self,
        post_id: Uuid,
        page: Pagination,
    ) -> Result<Page<CommentView>, RepoError>;
}
