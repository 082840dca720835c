use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::tag::Tag;
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{AdminUser, AuthUser},
};

#[derive(Debug, Deserialize, TS)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
}

/// GET /api/tags
pub async fn list_tags(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Tag>>>, ApiError> {
    let tags = Tag::find_all(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(tags)))
}

/// POST /api/tags
pub async fn create_tag(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<ResponseJson<ApiResponse<Tag>>, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("tag name must not be empty".to_string()));
    }
    let tag = Tag::create(&state.db.pool, name, payload.color.trim()).await?;
    Ok(ResponseJson(ApiResponse::success(tag)))
}

/// DELETE /api/tags/{id}
/// Links to work orders go with it.
pub async fn delete_tag(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Tag::delete(&state.db.pool, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("tag not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{id}", delete(delete_tag))
}
