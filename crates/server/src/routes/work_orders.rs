use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, patch, put},
};
use chrono::NaiveDate;
use db::models::{
    tag::Tag,
    work_order::{WorkOrder, WorkOrderView},
    work_order_status::WorkOrderStatus,
};
use serde::Deserialize;
use services::services::{
    events::{ChangeOp, Topic},
    work_order::{AgendaWeek, CreateWorkOrderRequest, UpdateWorkOrderRequest},
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, TS)]
pub struct MoveStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct SetTagsRequest {
    pub tag_ids: Vec<Uuid>,
}

/// GET /api/work-orders
/// The full board, tags attached. Every role sees every card.
pub async fn board(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<WorkOrderView>>>, ApiError> {
    let orders = state.work_orders.board(actor).await?;
    Ok(ResponseJson(ApiResponse::success(orders)))
}

/// GET /api/work-orders/for-date?date=
/// Technicians only see orders assigned to or created by them.
pub async fn for_date(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<WorkOrderView>>>, ApiError> {
    let orders = state.work_orders.for_date(actor, query.date).await?;
    Ok(ResponseJson(ApiResponse::success(orders)))
}

/// POST /api/work-orders
pub async fn create(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkOrderRequest>,
) -> Result<ResponseJson<ApiResponse<WorkOrderView>>, ApiError> {
    let view = state.work_orders.create_with_client(actor, payload).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// PUT /api/work-orders/{id}
pub async fn update(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkOrderRequest>,
) -> Result<ResponseJson<ApiResponse<WorkOrderView>>, ApiError> {
    let view = state
        .work_orders
        .update_with_client(actor, id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// PATCH /api/work-orders/{id}/status
pub async fn move_status(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveStatusRequest>,
) -> Result<ResponseJson<ApiResponse<WorkOrderView>>, ApiError> {
    let view = state.work_orders.move_status(id, &payload.status).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// PUT /api/work-orders/{id}/tags
/// Replace the tag set wholesale.
pub async fn set_tags(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetTagsRequest>,
) -> Result<ResponseJson<ApiResponse<WorkOrderView>>, ApiError> {
    if WorkOrder::find_by_id(&state.db.pool, id).await?.is_none() {
        return Err(ApiError::NotFound("work order not found".to_string()));
    }
    Tag::replace_for_work_order(&state.db.pool, id, &payload.tag_ids)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_foreign_key_violation() => {
                ApiError::BadRequest("unknown tag id".to_string())
            }
            _ => ApiError::Database(e),
        })?;
    state
        .events
        .publish_change(Topic::WorkOrders, ChangeOp::Update, id);

    let view = WorkOrder::find_view_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("work order not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// GET /api/work-order-statuses
/// The board columns, in display order.
pub async fn statuses(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<WorkOrderStatus>>>, ApiError> {
    let statuses = WorkOrderStatus::find_all(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(statuses)))
}

/// GET /api/agenda/week?date=
pub async fn agenda_week(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<ResponseJson<ApiResponse<AgendaWeek>>, ApiError> {
    let week = state.work_orders.agenda_week(actor, query.date).await?;
    Ok(ResponseJson(ApiResponse::success(week)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/work-orders", get(board).post(create))
        .route("/work-orders/for-date", get(for_date))
        .route("/work-orders/{id}", put(update))
        .route("/work-orders/{id}/status", patch(move_status))
        .route("/work-orders/{id}/tags", put(set_tags))
        .route("/work-order-statuses", get(statuses))
        .route("/agenda/week", get(agenda_week))
}
