use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, header::CONTENT_TYPE},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::profile::{CreateProfile, Profile, UpdateProfile, UserRole};
use services::services::{auth::AuthService, storage::MAX_AVATAR_BYTES};
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{AdminUser, AuthUser},
};

#[derive(Debug, Deserialize, TS)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
}

/// GET /api/profiles
pub async fn list_profiles(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Profile>>>, ApiError> {
    let profiles = Profile::find_all(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(profiles)))
}

/// GET /api/profiles/technicians
/// Active technicians only, for assignment pickers. Open to any role.
pub async fn list_technicians(
    AuthUser(_): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Profile>>>, ApiError> {
    let technicians = Profile::find_active_technicians(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(technicians)))
}

/// PUT /api/profiles/{id}
pub async fn update_profile(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfile>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let profile = Profile::update(&state.db.pool, id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// POST /api/admin/users
/// Create a login-capable profile. Replaces the old out-of-band user setup.
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("a valid email is required".to_string()));
    }
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }
    let hash = AuthService::hash_password(&payload.password)?;
    // The unique index on email is the only duplicate check.
    let profile = Profile::create(
        &state.db.pool,
        Uuid::new_v4(),
        &CreateProfile {
            email,
            name: name.to_string(),
            role: payload.role,
        },
        &hash,
    )
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            ApiError::BadRequest("email already in use".to_string())
        }
        _ => ApiError::Database(e),
    })?;

    info!(created_by = %admin.id, profile_id = %profile.id, role = %profile.role, "user created");
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// POST /api/profiles/me/avatar
/// Raw image body; the content type decides the stored extension.
pub async fn upload_avatar(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("content-type header is required".to_string()))?;

    let url = state
        .storage
        .save_avatar(actor.id, content_type, &body)
        .await?;
    Profile::update_avatar(&state.db.pool, actor.id, &url).await?;

    let profile = Profile::find_by_id(&state.db.pool, actor.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles", get(list_profiles))
        .route("/profiles/technicians", get(list_technicians))
        .route("/profiles/{id}", put(update_profile))
        // Axum's default body limit (2 MB) sits below the avatar cap; the
        // storage service still enforces the cap itself with a 400.
        .route(
            "/profiles/me/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(2 * MAX_AVATAR_BYTES)),
        )
        .route("/admin/users", post(create_user))
}
