//! Data Transfer Objects - request/response types for the API.
//!
//! Unknown fields in request bodies are ignored by serde, so a patch
//! carrying `author` or `slug` deserializes fine and changes nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Distinguishes an absent field from an explicit `null` in PATCH
/// bodies: missing stays `None`, `null` becomes `Some(None)`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

// ----- auth -----

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

// ----- categories -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    /// Derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

// ----- posts -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    /// Opaque reference into the media store.
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial post update. Slug and author are not accepted - they are
/// ignored if a client sends them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub category: Option<CategoryResponse>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub view_count: i64,
    pub comments_count: u64,
    pub is_liked: bool,
    pub likes_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// ----- comments -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    /// Display name; None for anonymous comments.
    pub author: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
}

// ----- interactions -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub likes_count: u64,
}

// ----- pagination envelope -----

/// Paged listing envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub count: u64,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_ignores_author_and_slug_fields() {
        let patch: UpdatePostRequest = serde_json::from_str(
            r#"{"title": "New", "author": "mallory", "slug": "hijacked-slug"}"#,
        )
        .unwrap();

        assert_eq!(patch.title.as_deref(), Some("New"));
        assert!(patch.content.is_none());
        assert!(patch.published.is_none());
    }

    #[test]
    fn update_request_distinguishes_null_from_missing() {
        let patch: UpdatePostRequest =
            serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(patch.category_id, Some(None));

        let patch: UpdatePostRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(patch.category_id, None);
    }

    #[test]
    fn page_response_serializes_count_and_results() {
        let page = PageResponse {
            count: 2,
            results: vec!["a", "b"],
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["results"][0], "a");
    }
}
