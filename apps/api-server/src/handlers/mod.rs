//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod posts;

use std::sync::Arc;

use actix_web::web;
use serde::Deserialize;

use quill_core::domain::{Category, CommentView, PostDetail};
use quill_core::ports::Pagination;
use quill_infra::rate_limit::InMemoryRateLimiter;
use quill_shared::dto::{CategoryResponse, CommentResponse, PostResponse};

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Page-size policy lives here at the edge, not in the services.
const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, like_limiter: Arc<InMemoryRateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Category routes
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::list))
                    .route("", web::post().to(categories::create))
                    .route("/{slug}", web::get().to(categories::get))
                    .route("/{id}", web::put().to(categories::update))
                    .route("/{id}", web::delete().to(categories::delete)),
            )
            // Post routes (slug-addressed) and nested interactions
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/{slug}", web::get().to(posts::get))
                    .route("/{slug}", web::patch().to(posts::update))
                    .route("/{slug}", web::put().to(posts::update))
                    .route("/{slug}", web::delete().to(posts::delete))
                    .service(
                        web::resource("/{slug}/like")
                            .wrap(RateLimitMiddleware::new(like_limiter))
                            .route(web::post().to(posts::toggle_like)),
                    )
                    .route("/{slug}/comments", web::get().to(posts::list_comments))
                    .route("/{slug}/comments", web::post().to(posts::add_comment)),
            )
            // Comment routes
            .route("/comments/{id}", web::delete().to(comments::delete)),
    );
}

/// Common `?page=&page_size=` query parameters.
#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

impl PageParams {
    /// Resolve 1-based page params into an offset/limit window.
    pub(crate) fn pagination(&self) -> Pagination {
        let limit = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        Pagination {
            offset: (page - 1) * limit,
            limit,
        }
    }
}

pub(crate) fn category_response(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name,
        slug: category.slug,
    }
}

pub(crate) fn comment_response(view: CommentView) -> CommentResponse {
    CommentResponse {
        id: view.comment.id,
        author: view.author_name,
        body: view.comment.body,
        created_at: view.comment.created_at,
        approved: view.comment.approved,
    }
}

pub(crate) fn post_response(detail: PostDetail, media_base_url: &str) -> PostResponse {
    let image_url = detail
        .post
        .image_ref
        .as_deref()
        .map(|image_ref| media_url(media_base_url, image_ref));

    PostResponse {
        id: detail.post.id,
        title: detail.post.title,
        slug: detail.post.slug,
        content: detail.post.content,
        author: detail.author_name,
        category: detail.category.map(category_response),
        published: detail.post.published,
        created_at: detail.post.created_at,
        updated_at: detail.post.updated_at,
        view_count: detail.post.view_count,
        comments_count: detail.comments_count,
        is_liked: detail.liked_by_viewer,
        likes_count: detail.likes_count,
        image: detail.post.image_ref,
        image_url,
    }
}

fn media_url(base: &str, image_ref: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        image_ref.trim_start_matches('/')
    )
}
