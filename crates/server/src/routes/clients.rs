use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::client::Client;
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extract::AuthUser};

const SEARCH_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    pub q: Option<String>,
}

/// GET /api/clients?q=
pub async fn search_clients(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Client>>>, ApiError> {
    let clients = Client::search(&state.db.pool, query.q.as_deref(), SEARCH_LIMIT).await?;
    Ok(ResponseJson(ApiResponse::success(clients)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/clients", get(search_clients))
}
