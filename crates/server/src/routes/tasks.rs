use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::task::Task;
use serde::Deserialize;
use services::services::events::{ChangeOp, Topic};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

const RECENT_LIMIT: i64 = 200;

#[derive(Debug, Deserialize, TS)]
pub struct CreateTaskRequest {
    pub title: String,
}

/// GET /api/tasks
pub async fn list_tasks(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_recent(&state.db.pool, RECENT_LIMIT).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

/// POST /api/tasks
pub async fn create_task(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    let task = Task::create(&state.db.pool, title).await?;
    state
        .events
        .publish_change(Topic::Tasks, ChangeOp::Insert, task.id);
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// POST /api/tasks/{id}/toggle
pub async fn toggle_task(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::toggle(&state.db.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;
    state
        .events
        .publish_change(Topic::Tasks, ChangeOp::Update, task.id);
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}/toggle", post(toggle_task))
}
