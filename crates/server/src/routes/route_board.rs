use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::NaiveDate;
use db::models::route_item::{RouteItem, RouteItemView};
use serde::Deserialize;
use services::services::route::AddToRouteRequest;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

/// GET /api/routes/for-date?date=
/// Both lanes for the day. Admins see every technician's items.
pub async fn for_date(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<RouteItemView>>>, ApiError> {
    let items = state.routes.for_date(actor, query.date).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// POST /api/routes/items
pub async fn add_item(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<AddToRouteRequest>,
) -> Result<ResponseJson<ApiResponse<RouteItem>>, ApiError> {
    let item = state.routes.add_to_route(actor, payload).await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

/// POST /api/routes/items/{id}/finish
pub async fn finish_item(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<RouteItem>>, ApiError> {
    let item = state.routes.finish(actor, id).await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/routes/for-date", get(for_date))
        .route("/routes/items", post(add_item))
        .route("/routes/items/{id}/finish", post(finish_item))
}
