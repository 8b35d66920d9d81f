//! Interaction service - like toggling layered on the content model.

use std::sync::Arc;

use uuid::Uuid;

use crate::caller::Caller;
use crate::error::{DomainError, RepoError};
use crate::ports::{LikeStatus, PostRepository};

/// Like membership for a (post, user) pair flips between exactly two
/// states; there is no terminal state.
pub struct InteractionService {
    posts: Arc<dyn PostRepository>,
}

impl InteractionService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Flip the caller's like on a post.
    ///
    /// The membership flip and the count read happen in one store
    /// transaction, so the returned count reflects the caller's own
    /// committed mutation even under concurrent toggles.
    pub async fn toggle_like(
        &self,
        post_id: Uuid,
        caller: &Caller,
    ) -> Result<LikeStatus, DomainError> {
        let user_id = caller.user_id().ok_or(DomainError::Unauthenticated)?;

        match self.posts.toggle_like(post_id, user_id).await {
            Ok(status) => Ok(status),
            Err(RepoError::NotFound) => Err(DomainError::NotFound { entity: "post" }),
            Err(e) => Err(e.into()),
        }
    }

    /// Membership check; always false for anonymous callers.
    pub async fn is_liked(&self, post_id: Uuid, caller: &Caller) -> Result<bool, DomainError> {
        match caller.user_id() {
            None => Ok(false),
            Some(user_id) => Ok(self.posts.is_liked(post_id, user_id).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Post;
    use crate::service::stubs::StubPosts;

    async fn seeded() -> (InteractionService, Arc<StubPosts>, Uuid) {
        let posts = Arc::new(StubPosts::default());
        let post = Post::new(
            Uuid::new_v4(),
            "Hello World".to_string(),
            "hello-world".to_string(),
            "content".to_string(),
            None,
            None,
        );
        let post_id = post.id;
        crate::ports::PostRepository::insert(posts.as_ref(), post)
            .await
            .unwrap();
        let service = InteractionService::new(posts.clone() as Arc<dyn PostRepository>);
        (service, posts, post_id)
    }

    #[tokio::test]
    async fn toggle_requires_identity() {
        let (service, _, post_id) = seeded().await;
        let err = service
            .toggle_like(post_id, &Caller::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn toggle_flips_state_every_call() {
        let (service, _, post_id) = seeded().await;
        let caller = Caller::authenticated(Uuid::new_v4(), false);

        let first = service.toggle_like(post_id, &caller).await.unwrap();
        assert!(first.liked);
        assert_eq!(first.likes_count, 1);
        assert!(service.is_liked(post_id, &caller).await.unwrap());

        let second = service.toggle_like(post_id, &caller).await.unwrap();
        assert!(!second.liked);
        assert_eq!(second.likes_count, 0);
        assert!(!service.is_liked(post_id, &caller).await.unwrap());

        // two calls return to the original state, never a no-op
        let third = service.toggle_like(post_id, &caller).await.unwrap();
        assert!(third.liked);
        assert_eq!(third.likes_count, 1);
    }

    #[tokio::test]
    async fn toggle_counts_are_per_post_across_users() {
        let (service, _, post_id) = seeded().await;
        let alice = Caller::authenticated(Uuid::new_v4(), false);
        let bob = Caller::authenticated(Uuid::new_v4(), false);

        service.toggle_like(post_id, &alice).await.unwrap();
        let status = service.toggle_like(post_id, &bob).await.unwrap();
        assert_eq!(status.likes_count, 2);

        let status = service.toggle_like(post_id, &alice).await.unwrap();
        assert!(!status.liked);
        assert_eq!(status.likes_count, 1);
        assert!(service.is_liked(post_id, &bob).await.unwrap());
    }

    #[tokio::test]
    async fn toggle_on_missing_post_is_not_found() {
        let (service, _, _) = seeded().await;
        let caller = Caller::authenticated(Uuid::new_v4(), false);
        let err = service
            .toggle_like(Uuid::new_v4(), &caller)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "post" }));
    }

    #[tokio::test]
    async fn is_liked_false_for_anonymous() {
        let (service, _, post_id) = seeded().await;
        assert!(!service.is_liked(post_id, &Caller::Anonymous).await.unwrap());
    }
}
