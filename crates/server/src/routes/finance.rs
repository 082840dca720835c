use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use chrono::NaiveDate;
use db::models::finance_entry::FinanceEntry;
use serde::Deserialize;
use services::services::finance::{CreateEntryRequest, FinanceSummary, SeriesPoint};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{AdminUser, AuthUser},
};

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /api/finance/entries?from=&to=
pub async fn list_entries(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<FinanceEntry>>>, ApiError> {
    let entries = state.finance.entries(range.from, range.to).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// POST /api/finance/entries
pub async fn add_entry(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<ResponseJson<ApiResponse<FinanceEntry>>, ApiError> {
    let entry = state.finance.add_entry(actor, payload).await?;
    Ok(ResponseJson(ApiResponse::success(entry)))
}

/// DELETE /api/finance/entries/{id}
pub async fn delete_entry(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.finance.delete_entry(admin, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/finance/series?from=&to=
/// One point per day, zeros where the ledger is empty.
pub async fn series(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<SeriesPoint>>>, ApiError> {
    let points = state.finance.series(range.from, range.to).await?;
    Ok(ResponseJson(ApiResponse::success(points)))
}

/// GET /api/finance/summary?from=&to=
pub async fn summary(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<ResponseJson<ApiResponse<FinanceSummary>>, ApiError> {
    let summary = state.finance.summary(range.from, range.to).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/finance/entries", get(list_entries).post(add_entry))
        .route("/finance/entries/{id}", delete(delete_entry))
        .route("/finance/series", get(series))
        .route("/finance/summary", get(summary))
}
