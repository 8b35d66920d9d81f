//! In-memory repositories for running without a database and for tests.
//!
//! One store backs all four repositories so relational behavior
//! (cascades, author names, counts) matches the real schema. All
//! mutations for a call happen under a single write lock, which is what
//! makes the slug-uniqueness and like-toggle guarantees hold under
//! concurrent use.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::domain::{Category, Comment, CommentView, Post, PostDetail, User};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryRepository, CommentRepository, LikeStatus, Page, Pagination, PostOrder, PostQuery,
    PostRepository, UserRepository,
};

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    likes: HashSet<(Uuid, Uuid)>,
}

impl StoreInner {
    fn likes_count(&self, post_id: Uuid) -> u64 {
        self.likes.iter().filter(|(pid, _)| *pid == post_id).count() as u64
    }

    fn approved_comments_count(&self, post_id: Uuid) -> u64 {
        self.comments
            .values()
            .filter(|c| c.post_id == post_id && c.approved)
            .count() as u64
    }

    fn author_name(&self, author_id: Uuid) -> String {
        self.users
            .get(&author_id)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| "deleted".to_string())
    }

    fn detail(&self, post: &Post, viewer: Option<Uuid>) -> PostDetail {
        PostDetail {
            post: post.clone(),
            author_name: self.author_name(post.author_id),
            category: post
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            likes_count: self.likes_count(post.id),
            liked_by_viewer: viewer
                .map(|uid| self.likes.contains(&(post.id, uid)))
                .unwrap_or(false),
            comments_count: self.approved_comments_count(post.id),
        }
    }

    fn matches_search(&self, post: &Post, term: &str) -> bool {
        let term = term.to_lowercase();
        if post.title.to_lowercase().contains(&term)
            || post.content.to_lowercase().contains(&term)
        {
            return true;
        }
        if self.author_name(post.author_id).to_lowercase().contains(&term) {
            return true;
        }
        post.category_id
            .and_then(|id| self.categories.get(&id))
            .is_some_and(|c| c.name.to_lowercase().contains(&term))
    }
}

/// Shared in-memory store; clones refer to the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut inner = self.inner.write().unwrap();
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(RepoError::Unique("username"));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Unique("email"));
        }
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.inner.read().unwrap().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn insert(&self, category: Category) -> Result<Category, RepoError> {
        let mut inner = self.inner.write().unwrap();
        if inner.categories.values().any(|c| c.name == category.name) {
            return Err(RepoError::Unique("name"));
        }
        if inner.categories.values().any(|c| c.slug == category.slug) {
            return Err(RepoError::Unique("slug"));
        }
        inner.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.categories.contains_key(&category.id) {
            return Err(RepoError::NotFound);
        }
        if inner
            .categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(RepoError::Unique("name"));
        }
        inner.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.inner.write().unwrap();
        if inner.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        // referencing posts keep living with a null category
        for post in inner.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.inner.read().unwrap().categories.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn name_exists(&self, name: &str) -> Result<bool, RepoError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .categories
            .values()
            .any(|c| c.name == name))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .categories
            .values()
            .any(|c| c.slug == slug))
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let mut all: Vec<Category> = self
            .inner
            .read()
            .unwrap()
            .categories
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        // uniqueness check and insert under one write lock, mirroring
        // the database's constraint enforcement at commit
        let mut inner = self.inner.write().unwrap();
        if inner.posts.values().any(|p| p.slug == post.slug) {
            return Err(RepoError::Unique("slug"));
        }
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.inner.write().unwrap();
        if inner.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        inner.comments.retain(|_, c| c.post_id != id);
        inner.likes.retain(|(pid, _)| *pid != id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.inner.read().unwrap().posts.get(&id).cloned())
    }

    async fn find_detail_by_slug(
        &self,
        slug: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<PostDetail>, RepoError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .posts
            .values()
            .find(|p| p.slug == slug)
            .map(|post| inner.detail(post, viewer)))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .posts
            .values()
            .any(|p| p.slug == slug))
    }

    async fn list(
        &self,
        query: &PostQuery,
        viewer: Option<Uuid>,
    ) -> Result<Page<PostDetail>, RepoError> {
        let inner = self.inner.read().unwrap();
        let mut items: Vec<PostDetail> = inner
            .posts
            .values()
            .filter(|p| {
                query
                    .category_id
                    .is_none_or(|cid| p.category_id == Some(cid))
            })
            .filter(|p| query.published.is_none_or(|published| p.published == published))
            .filter(|p| {
                query
                    .search
                    .as_deref()
                    .is_none_or(|term| inner.matches_search(p, term))
            })
            .map(|post| inner.detail(post, viewer))
            .collect();

        match query.order {
            PostOrder::CreatedAtDesc => {
                items.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at))
            }
            PostOrder::CreatedAtAsc => {
                items.sort_by(|a, b| a.post.created_at.cmp(&b.post.created_at))
            }
            PostOrder::UpdatedAtDesc => {
                items.sort_by(|a, b| b.post.updated_at.cmp(&a.post.updated_at))
            }
            PostOrder::UpdatedAtAsc => {
                items.sort_by(|a, b| a.post.updated_at.cmp(&b.post.updated_at))
            }
            PostOrder::LikesDesc => items.sort_by(|a, b| b.likes_count.cmp(&a.likes_count)),
            PostOrder::LikesAsc => items.sort_by(|a, b| a.likes_count.cmp(&b.likes_count)),
        }

        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(query.page.offset as usize)
            .take(query.page.limit as usize)
            .collect();

        Ok(Page { items, total })
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.inner.write().unwrap();
        let post = inner.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.view_count += 1;
        Ok(())
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus, RepoError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }
        let key = (post_id, user_id);
        let liked = if inner.likes.contains(&key) {
            inner.likes.remove(&key);
            false
        } else {
            inner.likes.insert(key);
            true
        };
        Ok(LikeStatus {
            liked,
            likes_count: inner.likes_count(post_id),
        })
    }

    async fn is_liked(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .likes
            .contains(&(post_id, user_id)))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.posts.contains_key(&comment.post_id) {
            return Err(RepoError::NotFound);
        }
        inner.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.inner.write().unwrap();
        if inner.comments.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.inner.read().unwrap().comments.get(&id).cloned())
    }

    async fn list_approved(
        &self,
        post_id: Uuid,
        page: Pagination,
    ) -> Result<Page<CommentView>, RepoError> {
        let inner = self.inner.read().unwrap();
        let mut matching: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.approved)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|comment| CommentView {
                author_name: comment
                    .author_id
                    .and_then(|id| inner.users.get(&id))
                    .map(|u| u.username.clone()),
                comment,
            })
            .collect();

        Ok(Page { items, total })
    }
}
