//! Post handlers: listing, slug-addressed CRUD, likes and comments.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use quill_core::ports::{PostOrder, PostQuery};
use quill_core::service::{NewPost, PostPatch};
use quill_shared::dto::{
    CreateCommentRequest, CreatePostRequest, PageResponse, ToggleLikeResponse, UpdatePostRequest,
};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

use super::{PageParams, comment_response, post_response};

/// Query parameters for the post listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub category: Option<uuid::Uuid>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    /// DRF-style ordering token, e.g. `-created_at` or `likes_count`.
    #[serde(default)]
    pub ordering: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

/// Unknown ordering tokens fall back to newest-first.
fn parse_ordering(token: Option<&str>) -> PostOrder {
    match token {
        Some("created_at") => PostOrder::CreatedAtAsc,
        Some("-created_at") => PostOrder::CreatedAtDesc,
        Some("updated_at") => PostOrder::UpdatedAtAsc,
        Some("-updated_at") => PostOrder::UpdatedAtDesc,
        Some("likes_count") => PostOrder::LikesAsc,
        Some("-likes_count") => PostOrder::LikesDesc,
        _ => PostOrder::default(),
    }
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    params: web::Query<ListParams>,
) -> AppResult<HttpResponse> {
    let page = PageParams {
        page: params.page,
        page_size: params.page_size,
    }
    .pagination();

    let query = PostQuery {
        category_id: params.category,
        published: params.published,
        search: params.search.clone().filter(|s| !s.trim().is_empty()),
        order: parse_ordering(params.ordering.as_deref()),
        page,
    };

    let result = state.content.list_posts(&query, &viewer.caller()).await?;

    Ok(HttpResponse::Ok().json(PageResponse {
        count: result.total,
        results: result
            .items
            .into_iter()
            .map(|detail| post_response(detail, &state.media_base_url))
            .collect::<Vec<_>>(),
    }))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let caller = identity.caller();

    let post = state
        .content
        .create_post(
            &caller,
            NewPost {
                title: req.title,
                content: req.content,
                category_id: req.category_id,
                image_ref: req.image,
            },
        )
        .await?;

    let detail = state.content.post_detail(post.id, &caller).await?;
    Ok(HttpResponse::Created().json(post_response(detail, &state.media_base_url)))
}

/// GET /api/posts/{slug} - records a view
pub async fn get(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let detail = state.content.get_post(&slug, &viewer.caller()).await?;
    Ok(HttpResponse::Ok().json(post_response(detail, &state.media_base_url)))
}

/// PATCH/PUT /api/posts/{slug}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    slug: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let caller = identity.caller();

    let existing = state.content.peek_post(&slug, &caller).await?;
    let post = state
        .content
        .update_post(
            &caller,
            existing.post.id,
            PostPatch {
                title: req.title,
                content: req.content,
                category_id: req.category_id,
                image_ref: req.image,
                published: req.published,
            },
        )
        .await?;

    let detail = state.content.post_detail(post.id, &caller).await?;
    Ok(HttpResponse::Ok().json(post_response(detail, &state.media_base_url)))
}

/// DELETE /api/posts/{slug}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let caller = identity.caller();
    let existing = state.content.peek_post(&slug, &caller).await?;
    state.content.delete_post(&caller, existing.post.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{slug}/like - authenticated, rate limited
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let caller = identity.caller();
    let existing = state.content.peek_post(&slug, &caller).await?;

    let status = state
        .interactions
        .toggle_like(existing.post.id, &caller)
        .await?;

    Ok(HttpResponse::Ok().json(ToggleLikeResponse {
        liked: status.liked,
        likes_count: status.likes_count,
    }))
}

/// GET /api/posts/{slug}/comments - approved comments, newest first
pub async fn list_comments(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    slug: web::Path<String>,
    params: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let caller = viewer.caller();
    let existing = state.content.peek_post(&slug, &caller).await?;

    let page = state
        .content
        .list_approved_comments(existing.post.id, params.pagination())
        .await?;

    Ok(HttpResponse::Ok().json(PageResponse {
        count: page.total,
        results: page
            .items
            .into_iter()
            .map(comment_response)
            .collect::<Vec<_>>(),
    }))
}

/// POST /api/posts/{slug}/comments - open to anonymous callers
pub async fn add_comment(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    slug: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let caller = viewer.caller();
    let existing = state.content.peek_post(&slug, &caller).await?;

    let comment = state
        .content
        .create_comment(existing.post.id, &caller, &body.body)
        .await?;

    let author_name = viewer.0.as_ref().map(|identity| identity.username.clone());
    Ok(
        HttpResponse::Created().json(comment_response(quill_core::domain::CommentView {
            comment,
            author_name,
        })),
    )
}
