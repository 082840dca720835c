//! Bearer-token extractors. The route boundary from the original system:
//! everything but login (and static files) requires an authenticated,
//! active profile.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use db::models::profile::Profile;
use services::services::auth::Actor;

use crate::{AppState, error::ApiError};

/// Any authenticated, active profile.
pub struct AuthUser(pub Actor);

/// Admin-gated variant for privileged endpoints.
pub struct AdminUser(pub Actor);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let claims = state
            .auth
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized)?;

        // Tokens outlive role/active edits; re-check the profile row.
        let profile = Profile::find_by_id(&state.db.pool, claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        if !profile.active {
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser(Actor {
            id: profile.id,
            role: profile.role,
        }))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(actor) = AuthUser::from_request_parts(parts, state).await?;
        if !actor.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(actor))
    }
}
