//! Credential checks and bearer-token sessions. Auth-provider internals stay
//! out of scope; this is the whole surface the API needs.

use chrono::{Duration, Utc};
use db::models::profile::{Profile, UserRole};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// The authenticated caller, as every service sees it. Role checks happen
/// server-side against this, never against anything client-supplied.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("profile is inactive")]
    Inactive,
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(pool: SqlitePool, secret: String) -> Self {
        Self {
            pool,
            secret,
            token_ttl: Duration::hours(12),
        }
    }

    /// Verify credentials and mint a bearer token. Inactive profiles cannot
    /// log in.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Profile), AuthError> {
        let profile = Profile::find_by_email(&self.pool, email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !bcrypt::verify(password, &profile.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !profile.active {
            return Err(AuthError::Inactive);
        }

        let token = self.issue_token(&profile)?;
        info!(profile_id = %profile.id, role = %profile.role, "login");
        Ok((token, profile))
    }

    pub fn issue_token(&self, profile: &Profile) -> Result<String, AuthError> {
        let claims = Claims {
            sub: profile.id,
            role: profile.role,
            exp: (Utc::now() + self.token_ttl).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }

    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
    }
}
