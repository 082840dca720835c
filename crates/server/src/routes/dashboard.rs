use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::dashboard::DashboardSummary;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extract::AuthUser};

/// GET /api/dashboard
/// Role-shaped counters; admins get board totals, technicians their day.
pub async fn summary(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<DashboardSummary>>, ApiError> {
    let summary = state.dashboard.summary(actor).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(summary))
}
