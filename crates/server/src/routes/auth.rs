use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::profile::Profile;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extract::AuthUser};

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub profile: Profile,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let (token, profile) = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ResponseJson(ApiResponse::success(LoginResponse {
        token,
        profile,
    })))
}

/// GET /api/auth/me
pub async fn me(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let profile = Profile::find_by_id(&state.db.pool, actor.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}
