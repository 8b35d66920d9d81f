//! Comment handlers. Creation and listing are nested under posts; only
//! deletion is addressed directly.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// DELETE /api/comments/{id} - comment author or admin
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.content.delete_comment(&identity.caller(), *id).await?;
    Ok(HttpResponse::NoContent().finish())
}
