//! Category handlers. Reads are public; writes require the admin role,
//! enforced by the content service.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_shared::dto::{CreateCategoryRequest, UpdateCategoryRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

use super::category_response;

/// GET /api/categories
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.content.list_categories().await?;
    let body: Vec<_> = categories.into_iter().map(category_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/categories/{slug}
pub async fn get(state: web::Data<AppState>, slug: web::Path<String>) -> AppResult<HttpResponse> {
    let category = state.content.get_category(&slug).await?;
    Ok(HttpResponse::Ok().json(category_response(category)))
}

/// POST /api/categories
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let category = state
        .content
        .create_category(&identity.caller(), &req.name, req.slug.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(category_response(category)))
}

/// PUT /api/categories/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
    body: web::Json<UpdateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let category = state
        .content
        .update_category(&identity.caller(), *id, &body.name)
        .await?;
    Ok(HttpResponse::Ok().json(category_response(category)))
}

/// DELETE /api/categories/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .content
        .delete_category(&identity.caller(), *id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
