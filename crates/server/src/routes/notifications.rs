use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::notification::Notification;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

/// GET /api/notifications
/// The caller's most recent notifications, unread first.
pub async fn list_notifications(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = state.notifications.recent_for_user(actor.id).await?;
    Ok(ResponseJson(ApiResponse::success(notifications)))
}

/// POST /api/notifications/{id}/read
/// Scoped to the caller; `read_at` never moves once set.
pub async fn mark_read(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Notification>>, ApiError> {
    let notification = state
        .notifications
        .mark_read(actor.id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("notification not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(notification)))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<u64>>, ApiError> {
    let updated = state.notifications.mark_all_read(actor.id).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
}
