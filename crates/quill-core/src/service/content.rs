//! Content service - create/read/update/delete for categories, posts and
//! comments, with ownership and uniqueness rules enforced here rather
//! than in the gateway.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::caller::Caller;
use crate::domain::{Category, Comment, Post, PostDetail};
use crate::error::{DomainError, RepoError};
use crate::ports::{
    CategoryRepository, CommentRepository, Page, Pagination, PostQuery, PostRepository,
};
use crate::slug;

use super::{require_admin, require_owner_or_admin};

/// Post slug bases leave room for the `-N` suffix under the 300 column.
const POST_SLUG_BASE_LEN: usize = 200;
/// Category slug bases leave room under the 120 column.
const CATEGORY_SLUG_BASE_LEN: usize = 100;
const MAX_CATEGORY_SLUG_LEN: usize = 120;
const MAX_TITLE_LEN: usize = 255;
const MAX_CATEGORY_NAME_LEN: usize = 100;

/// A commit-time slug collision means we lost an allocation race; the
/// loop re-derives and retries this many times before giving up.
const SLUG_INSERT_ATTEMPTS: usize = 3;

/// Input for creating a post. Author is never part of it - the caller's
/// identity is the author.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category_id: Option<Uuid>,
    pub image_ref: Option<String>,
}

/// Partial update for a post. Author and slug are not representable
/// here: the author never changes and the slug is immutable.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` clears the category, `Some(Some(id))` sets it.
    pub category_id: Option<Option<Uuid>>,
    pub image_ref: Option<Option<String>>,
    pub published: Option<bool>,
}

/// Orchestrates CRUD over categories, posts and comments.
pub struct ContentService {
    categories: Arc<dyn CategoryRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl ContentService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            categories,
            posts,
            comments,
        }
    }

    // ----- categories -----

    /// Create a category. Admin only. The slug is derived from the name
    /// unless an explicit one is supplied.
    pub async fn create_category(
        &self,
        caller: &Caller,
        name: &str,
        explicit_slug: Option<&str>,
    ) -> Result<Category, DomainError> {
        require_admin(caller)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("category name is required".into()));
        }
        if name.len() > MAX_CATEGORY_NAME_LEN {
            return Err(DomainError::Validation(format!(
                "category name exceeds {MAX_CATEGORY_NAME_LEN} characters"
            )));
        }
        if self.categories.name_exists(name).await? {
            return Err(DomainError::DuplicateName(name.to_string()));
        }

        let slug_value = match explicit_slug {
            Some(s) => {
                let s = s.trim();
                if s.is_empty() || s.len() > MAX_CATEGORY_SLUG_LEN || slug::slugify(s) != s {
                    return Err(DomainError::Validation(
                        "slug must be a lowercase URL-safe token".into(),
                    ));
                }
                if self.categories.slug_exists(s).await? {
                    return Err(DomainError::DuplicateSlug(s.to_string()));
                }
                s.to_string()
            }
            None => {
                let repo = Arc::clone(&self.categories);
                slug::allocate(name, CATEGORY_SLUG_BASE_LEN, move |candidate| {
                    let repo = Arc::clone(&repo);
                    async move { repo.slug_exists(&candidate).await }
                })
                .await?
            }
        };

        let category = Category::new(name.to_string(), slug_value);
        let slug_value = category.slug.clone();
        match self.categories.insert(category).await {
            Ok(category) => Ok(category),
            Err(RepoError::Unique("name")) => Err(DomainError::DuplicateName(name.to_string())),
            Err(RepoError::Unique(_)) => Err(DomainError::DuplicateSlug(slug_value)),
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a category. Admin only. The slug stays as assigned.
    pub async fn update_category(
        &self,
        caller: &Caller,
        id: Uuid,
        name: &str,
    ) -> Result<Category, DomainError> {
        require_admin(caller)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("category name is required".into()));
        }
        if name.len() > MAX_CATEGORY_NAME_LEN {
            return Err(DomainError::Validation(format!(
                "category name exceeds {MAX_CATEGORY_NAME_LEN} characters"
            )));
        }

        let mut category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound { entity: "category" })?;

        if category.name != name && self.categories.name_exists(name).await? {
            return Err(DomainError::DuplicateName(name.to_string()));
        }

        category.name = name.to_string();
        match self.categories.update(category).await {
            Ok(category) => Ok(category),
            Err(RepoError::Unique(_)) => Err(DomainError::DuplicateName(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a category. Admin only. Referencing posts keep living with
    /// a null category.
    pub async fn delete_category(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        require_admin(caller)?;

        match self.categories.delete(id).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(DomainError::NotFound { entity: "category" }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.categories.list().await?)
    }

    pub async fn get_category(&self, slug: &str) -> Result<Category, DomainError> {
        self.categories
            .find_by_slug(slug)
            .await?
            .ok_or(DomainError::NotFound { entity: "category" })
    }

    // ----- posts -----

    /// Create a post authored by the caller.
    ///
    /// The slug is derived from the title and checked for uniqueness, but
    /// two concurrent creates with the same title can both pass the check.
    /// The store's unique constraint catches that at commit; we re-derive
    /// and retry a bounded number of times before surfacing `Conflict`.
    pub async fn create_post(&self, caller: &Caller, input: NewPost) -> Result<Post, DomainError> {
        let author_id = caller.user_id().ok_or(DomainError::Unauthenticated)?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("title is required".into()));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(DomainError::Validation(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if input.content.trim().is_empty() {
            return Err(DomainError::Validation("content is required".into()));
        }

        if let Some(category_id) = input.category_id {
            if self.categories.find_by_id(category_id).await?.is_none() {
                return Err(DomainError::NotFound { entity: "category" });
            }
        }

        for _ in 0..SLUG_INSERT_ATTEMPTS {
            let repo = Arc::clone(&self.posts);
            let slug_value = slug::allocate(&title, POST_SLUG_BASE_LEN, move |candidate| {
                let repo = Arc::clone(&repo);
                async move { repo.slug_exists(&candidate).await }
            })
            .await?;

            let post = Post::new(
                author_id,
                title.clone(),
                slug_value,
                input.content.clone(),
                input.category_id,
                input.image_ref.clone(),
            );

            match self.posts.insert(post).await {
                Ok(post) => return Ok(post),
                Err(RepoError::Unique("slug")) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::Conflict(
            "slug allocation kept losing to concurrent writers".into(),
        ))
    }

    /// Patch a post. Owner or admin only. The slug never changes; the
    /// author never changes.
    pub async fn update_post(
        &self,
        caller: &Caller,
        post_id: Uuid,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        let mut post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "post" })?;

        require_owner_or_admin(caller, post.author_id)?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(DomainError::Validation("title is required".into()));
            }
            if title.len() > MAX_TITLE_LEN {
                return Err(DomainError::Validation(format!(
                    "title exceeds {MAX_TITLE_LEN} characters"
                )));
            }
            post.title = title;
        }
        if let Some(content) = patch.content {
            if content.trim().is_empty() {
                return Err(DomainError::Validation("content is required".into()));
            }
            post.content = content;
        }
        if let Some(category_id) = patch.category_id {
            if let Some(id) = category_id {
                if self.categories.find_by_id(id).await?.is_none() {
                    return Err(DomainError::NotFound { entity: "category" });
                }
            }
            post.category_id = category_id;
        }
        if let Some(image_ref) = patch.image_ref {
            post.image_ref = image_ref;
        }
        if let Some(published) = patch.published {
            post.published = published;
        }

        post.updated_at = Utc::now();
        Ok(self.posts.update(post).await?)
    }

    /// Delete a post. Owner or admin only. Comments and likes go with it.
    pub async fn delete_post(&self, caller: &Caller, post_id: Uuid) -> Result<(), DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "post" })?;

        require_owner_or_admin(caller, post.author_id)?;

        match self.posts.delete(post.id).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(DomainError::NotFound { entity: "post" }),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a post by slug and record the view.
    pub async fn get_post(&self, slug: &str, viewer: &Caller) -> Result<PostDetail, DomainError> {
        let mut detail = self.peek_post(slug, viewer).await?;

        self.posts.increment_view_count(detail.post.id).await?;
        detail.post.view_count += 1;

        Ok(detail)
    }

    /// Slug lookup without recording a view, for internal resolution
    /// (like/comment routes addressed by slug).
    pub async fn peek_post(&self, slug: &str, viewer: &Caller) -> Result<PostDetail, DomainError> {
        self.posts
            .find_detail_by_slug(slug, viewer.user_id())
            .await?
            .ok_or(DomainError::NotFound { entity: "post" })
    }

    /// Detail by id without recording a view, for echoing state back
    /// after a write.
    pub async fn post_detail(
        &self,
        post_id: Uuid,
        viewer: &Caller,
    ) -> Result<PostDetail, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "post" })?;
        self.peek_post(&post.slug, viewer).await
    }

    /// List posts. Empty result sets are a normal outcome, not an error.
    pub async fn list_posts(
        &self,
        query: &PostQuery,
        viewer: &Caller,
    ) -> Result<Page<PostDetail>, DomainError> {
        Ok(self.posts.list(query, viewer.user_id()).await?)
    }

    // ----- comments -----

    /// Add a comment to a post. Anonymous callers are welcome; their
    /// comments carry no author. Approved by default - there is no
    /// moderation queue.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        caller: &Caller,
        body: &str,
    ) -> Result<Comment, DomainError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DomainError::Validation("comment body is required".into()));
        }

        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::NotFound { entity: "post" });
        }

        let comment = Comment::new(post_id, caller.user_id(), body.to_string());
        Ok(self.comments.insert(comment).await?)
    }

    /// Hard-delete a comment. Comment author or admin only; anonymous
    /// comments can only be removed by an admin.
    pub async fn delete_comment(
        &self,
        caller: &Caller,
        comment_id: Uuid,
    ) -> Result<(), DomainError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "comment" })?;

        let authorized = match comment.author_id {
            Some(author_id) => {
                caller.is_admin() || caller.user_id().is_some_and(|id| id == author_id)
            }
            None => caller.is_admin(),
        };
        if !authorized {
            return match caller {
                Caller::Anonymous => Err(DomainError::Unauthenticated),
                _ => Err(DomainError::Forbidden),
            };
        }

        match self.comments.delete(comment.id).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(DomainError::NotFound { entity: "comment" }),
            Err(e) => Err(e.into()),
        }
    }

    /// Approved comments for a post, newest first. A missing post yields
    /// an empty page rather than an error.
    pub async fn list_approved_comments(
        &self,
        post_id: Uuid,
        page: Pagination,
    ) -> Result<Page<crate::domain::CommentView>, DomainError> {
        Ok(self.comments.list_approved(post_id, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::service::stubs::{StubCategories, StubComments, StubPosts};

    fn service(posts: StubPosts) -> ContentService {
        ContentService::new(
            Arc::new(StubCategories::default()),
            Arc::new(posts),
            Arc::new(StubComments::default()),
        )
    }

    fn new_post_input() -> NewPost {
        NewPost {
            title: "Hello World".to_string(),
            content: "some content".to_string(),
            category_id: None,
            image_ref: None,
        }
    }

    #[tokio::test]
    async fn create_post_requires_identity() {
        let svc = service(StubPosts::default());
        let err = svc
            .create_post(&Caller::Anonymous, new_post_input())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn create_post_sets_author_and_defaults() {
        let svc = service(StubPosts::default());
        let author = Uuid::new_v4();
        let caller = Caller::authenticated(author, false);

        let post = svc.create_post(&caller, new_post_input()).await.unwrap();

        assert_eq!(post.author_id, author);
        assert_eq!(post.slug, "hello-world");
        assert!(!post.published);
        assert_eq!(post.view_count, 0);
    }

    #[tokio::test]
    async fn create_post_rejects_empty_title() {
        let svc = service(StubPosts::default());
        let caller = Caller::authenticated(Uuid::new_v4(), false);
        let err = svc
            .create_post(
                &caller,
                NewPost {
                    title: "   ".to_string(),
                    ..new_post_input()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_post_retries_after_losing_slug_race() {
        // The existence probe sees nothing, but the first two inserts
        // collide at commit time.
        let posts = StubPosts {
            unique_failures: AtomicUsize::new(2),
            ..StubPosts::default()
        };
        let svc = service(posts);
        let caller = Caller::authenticated(Uuid::new_v4(), false);

        let post = svc.create_post(&caller, new_post_input()).await.unwrap();
        assert_eq!(post.slug, "hello-world");
    }

    #[tokio::test]
    async fn create_post_surfaces_conflict_after_bounded_retries() {
        let posts = StubPosts {
            unique_failures: AtomicUsize::new(usize::MAX),
            ..StubPosts::default()
        };
        let svc = service(posts);
        let caller = Caller::authenticated(Uuid::new_v4(), false);

        let err = svc
            .create_post(&caller, new_post_input())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_post_cannot_change_author_or_slug() {
        let author = Uuid::new_v4();
        let posts = StubPosts::default();
        let svc = service(posts);
        let caller = Caller::authenticated(author, false);

        let created = svc.create_post(&caller, new_post_input()).await.unwrap();

        let updated = svc
            .update_post(
                &caller,
                created.id,
                PostPatch {
                    title: Some("Renamed Entirely".to_string()),
                    content: Some("new content".to_string()),
                    published: Some(true),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.author_id, author);
        assert_eq!(updated.slug, created.slug);
        assert_eq!(updated.title, "Renamed Entirely");
        assert!(updated.published);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_post_forbidden_for_non_owner() {
        let owner = Caller::authenticated(Uuid::new_v4(), false);
        let svc = service(StubPosts::default());
        let created = svc.create_post(&owner, new_post_input()).await.unwrap();

        let stranger = Caller::authenticated(Uuid::new_v4(), false);
        let err = svc
            .update_post(
                &stranger,
                created.id,
                PostPatch {
                    title: Some("hijack".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        // unchanged
        let post = svc.posts.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(post.title, "Hello World");
    }

    #[tokio::test]
    async fn update_post_allowed_for_admin() {
        let owner = Caller::authenticated(Uuid::new_v4(), false);
        let svc = service(StubPosts::default());
        let created = svc.create_post(&owner, new_post_input()).await.unwrap();

        let admin = Caller::authenticated(Uuid::new_v4(), true);
        let updated = svc
            .update_post(
                &admin,
                created.id,
                PostPatch {
                    published: Some(true),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.published);
        // admin edits do not reassign ownership
        assert_eq!(updated.author_id, owner.user_id().unwrap());
    }

    #[tokio::test]
    async fn delete_post_forbidden_for_non_owner() {
        let owner = Caller::authenticated(Uuid::new_v4(), false);
        let svc = service(StubPosts::default());
        let created = svc.create_post(&owner, new_post_input()).await.unwrap();

        let stranger = Caller::authenticated(Uuid::new_v4(), false);
        let err = svc.delete_post(&stranger, created.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        assert!(svc.posts.find_by_id(created.id).await.unwrap().is_some());

        svc.delete_post(&owner, created.id).await.unwrap();
        assert!(svc.posts.find_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sequential_same_title_posts_get_suffixed_slugs() {
        let svc = service(StubPosts::default());
        let caller = Caller::authenticated(Uuid::new_v4(), false);

        let first = svc.create_post(&caller, new_post_input()).await.unwrap();
        let second = svc.create_post(&caller, new_post_input()).await.unwrap();

        assert_eq!(first.slug, "hello-world");
        assert_eq!(second.slug, "hello-world-1");
    }

    #[tokio::test]
    async fn create_category_is_admin_only() {
        let svc = service(StubPosts::default());

        let err = svc
            .create_category(&Caller::Anonymous, "Rust", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));

        let user = Caller::authenticated(Uuid::new_v4(), false);
        let err = svc.create_category(&user, "Rust", None).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let admin = Caller::authenticated(Uuid::new_v4(), true);
        let category = svc.create_category(&admin, "Rust Tips", None).await.unwrap();
        assert_eq!(category.slug, "rust-tips");
    }

    #[tokio::test]
    async fn create_category_duplicate_name_and_slug() {
        let svc = service(StubPosts::default());
        let admin = Caller::authenticated(Uuid::new_v4(), true);

        svc.create_category(&admin, "Rust", None).await.unwrap();

        let err = svc.create_category(&admin, "Rust", None).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateName(_)));

        let err = svc
            .create_category(&admin, "Rusty", Some("rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateSlug(_)));
    }

    #[tokio::test]
    async fn create_category_rejects_malformed_explicit_slug() {
        let svc = service(StubPosts::default());
        let admin = Caller::authenticated(Uuid::new_v4(), true);

        let err = svc
            .create_category(&admin, "Rust", Some("Not A Slug"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn anonymous_comment_has_no_author_and_is_approved() {
        let svc = service(StubPosts::default());
        let author = Caller::authenticated(Uuid::new_v4(), false);
        let post = svc.create_post(&author, new_post_input()).await.unwrap();

        let comment = svc
            .create_comment(post.id, &Caller::Anonymous, "nice post")
            .await
            .unwrap();

        assert_eq!(comment.author_id, None);
        assert!(comment.approved);
        assert_eq!(comment.body, "nice post");
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let svc = service(StubPosts::default());
        let err = svc
            .create_comment(Uuid::new_v4(), &Caller::Anonymous, "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "post" }));
    }

    #[tokio::test]
    async fn anonymous_comment_deletable_only_by_admin() {
        let svc = service(StubPosts::default());
        let author = Caller::authenticated(Uuid::new_v4(), false);
        let post = svc.create_post(&author, new_post_input()).await.unwrap();
        let comment = svc
            .create_comment(post.id, &Caller::Anonymous, "drive-by")
            .await
            .unwrap();

        let err = svc.delete_comment(&author, comment.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let admin = Caller::authenticated(Uuid::new_v4(), true);
        svc.delete_comment(&admin, comment.id).await.unwrap();
    }

    #[tokio::test]
    async fn comment_author_can_delete_own_comment() {
        let svc = service(StubPosts::default());
        let author = Caller::authenticated(Uuid::new_v4(), false);
        let post = svc.create_post(&author, new_post_input()).await.unwrap();

        let commenter = Caller::authenticated(Uuid::new_v4(), false);
        let comment = svc
            .create_comment(post.id, &commenter, "mine")
            .await
            .unwrap();

        let stranger = Caller::authenticated(Uuid::new_v4(), false);
        let err = svc.delete_comment(&stranger, comment.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        svc.delete_comment(&commenter, comment.id).await.unwrap();
    }

    #[tokio::test]
    async fn get_post_records_a_view() {
        let svc = service(StubPosts::default());
        let author = Caller::authenticated(Uuid::new_v4(), false);
        let post = svc.create_post(&author, new_post_input()).await.unwrap();

        let detail = svc.get_post(&post.slug, &Caller::Anonymous).await.unwrap();
        assert_eq!(detail.post.view_count, 1);

        let detail = svc.get_post(&post.slug, &Caller::Anonymous).await.unwrap();
        assert_eq!(detail.post.view_count, 2);
    }
}
