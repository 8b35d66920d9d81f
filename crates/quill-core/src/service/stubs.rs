//! Minimal in-memory repositories for service unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentView, Post, PostDetail, User};
use crate::error::RepoError;
use crate::ports::{
    CategoryRepository, CommentRepository, LikeStatus, Page, Pagination, PostQuery,
    PostRepository, UserRepository,
};

#[derive(Default)]
pub(crate) struct StubCategories {
    categories: Mutex<HashMap<Uuid, Category>>,
}

#[async_trait]
impl CategoryRepository for StubCategories {
    async fn insert(&self, category: Category) -> Result<Category, RepoError> {
        let mut map = self.categories.lock().unwrap();
        if map.values().any(|c| c.name == category.name) {
            return Err(RepoError::Unique("name"));
        }
        if map.values().any(|c| c.slug == category.slug) {
            return Err(RepoError::Unique("slug"));
        }
        map.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut map = self.categories.lock().unwrap();
        if map
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(RepoError::Unique("name"));
        }
        if !map.contains_key(&category.id) {
            return Err(RepoError::NotFound);
        }
        map.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.categories
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.categories.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn name_exists(&self, name: &str) -> Result<bool, RepoError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .values()
            .any(|c| c.name == name))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .values()
            .any(|c| c.slug == slug))
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let mut all: Vec<Category> = self.categories.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

#[derive(Default)]
pub(crate) struct StubPosts {
    pub posts: Mutex<HashMap<Uuid, Post>>,
    pub likes: Mutex<HashSet<(Uuid, Uuid)>>,
    /// Number of upcoming inserts that fail with a slug collision, as if
    /// a concurrent writer committed first.
    pub unique_failures: AtomicUsize,
}

#[async_trait]
impl PostRepository for StubPosts {
    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        loop {
            let remaining = self.unique_failures.load(Ordering::SeqCst);
            if remaining == 0 {
                break;
            }
            let next = remaining.saturating_sub(1);
            if self
                .unique_failures
                .compare_exchange(remaining, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Err(RepoError::Unique("slug"));
            }
        }

        let mut map = self.posts.lock().unwrap();
        if map.values().any(|p| p.slug == post.slug) {
            return Err(RepoError::Unique("slug"));
        }
        map.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut map = self.posts.lock().unwrap();
        if !map.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        map.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)?;
        self.likes.lock().unwrap().retain(|(post_id, _)| *post_id != id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.lock().unwrap().get(&id).cloned())
    }

    async fn find_detail_by_slug(
        &self,
        slug: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<PostDetail>, RepoError> {
        let posts = self.posts.lock().unwrap();
        let likes = self.likes.lock().unwrap();
        Ok(posts.values().find(|p| p.slug == slug).map(|post| {
            let likes_count = likes.iter().filter(|(pid, _)| *pid == post.id).count() as u64;
            let liked_by_viewer = viewer
                .map(|uid| likes.contains(&(post.id, uid)))
                .unwrap_or(false);
            PostDetail {
                post: post.clone(),
                author_name: "author".to_string(),
                category: None,
                likes_count,
                liked_by_viewer,
                comments_count: 0,
            }
        }))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(self.posts.lock().unwrap().values().any(|p| p.slug == slug))
    }

    async fn list(
        &self,
        query: &PostQuery,
        viewer: Option<Uuid>,
    ) -> Result<Page<PostDetail>, RepoError> {
        let posts = self.posts.lock().unwrap();
        let likes = self.likes.lock().unwrap();
        let mut items: Vec<PostDetail> = posts
            .values()
            .filter(|p| query.published.is_none_or(|published| p.published == published))
            .map(|post| PostDetail {
                post: post.clone(),
                author_name: "author".to_string(),
                category: None,
                likes_count: likes.iter().filter(|(pid, _)| *pid == post.id).count() as u64,
                liked_by_viewer: viewer
                    .map(|uid| likes.contains(&(post.id, uid)))
                    .unwrap_or(false),
                comments_count: 0,
            })
            .collect();
        items.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(query.page.offset as usize)
            .take(query.page.limit as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        let mut map = self.posts.lock().unwrap();
        let post = map.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.view_count += 1;
        Ok(())
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus, RepoError> {
        let posts = self.posts.lock().unwrap();
        if !posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }
        let mut likes = self.likes.lock().unwrap();
        let key = (post_id, user_id);
        let liked = if likes.contains(&key) {
            likes.remove(&key);
            false
        } else {
            likes.insert(key);
            true
        };
        let likes_count = likes.iter().filter(|(pid, _)| *pid == post_id).count() as u64;
        Ok(LikeStatus { liked, likes_count })
    }

    async fn is_liked(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        Ok(self.likes.lock().unwrap().contains(&(post_id, user_id)))
    }
}

#[derive(Default)]
pub(crate) struct StubComments {
    comments: Mutex<HashMap<Uuid, Comment>>,
}

#[async_trait]
impl CommentRepository for StubComments {
    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        self.comments
            .lock()
            .unwrap()
            .insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.comments
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.comments.lock().unwrap().get(&id).cloned())
    }

    async fn list_approved(
        &self,
        post_id: Uuid,
        page: Pagination,
    ) -> Result<Page<CommentView>, RepoError> {
        let comments = self.comments.lock().unwrap();
        let mut matching: Vec<Comment> = comments
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
                comment,
                author_name: None,
            })
            .collect();
        Ok(Page { items, total })
    }
}

/// Kept for symmetry with the other stubs; user lookups only appear in
/// gateway-level flows.
#[derive(Default)]
#[allow(dead_code)]
pub(crate) struct StubUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for StubUsers {
    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut map = self.users.lock().unwrap();
        if map.values().any(|u| u.username == user.username) {
            return Err(RepoError::Unique("username"));
        }
        if map.values().any(|u| u.email == user.email) {
            return Err(RepoError::Unique("email"));
        }
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}
