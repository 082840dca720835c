use anyhow::Context;
use db::{
    DBService,
    models::profile::{CreateProfile, Profile, UserRole},
};
use server::{AppState, ServerConfig, routes};
use services::services::auth::AuthService;
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init();

    let config = ServerConfig::from_env()?;
    let db = DBService::new(&config.database_url)
        .await
        .context("failed to open database")?;

    bootstrap_admin(&db).await?;

    let state = AppState::new(db, &config);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// A fresh database has no way to log in. Seed one admin from the
/// environment; after that the endpoint for creating users takes over.
async fn bootstrap_admin(db: &DBService) -> anyhow::Result<()> {
    if Profile::count(&db.pool).await? > 0 {
        return Ok(());
    }

    let email = std::env::var("FIELDOPS_ADMIN_EMAIL")
        .context("empty database: FIELDOPS_ADMIN_EMAIL is required to seed the first admin")?;
    let password = std::env::var("FIELDOPS_ADMIN_PASSWORD")
        .context("empty database: FIELDOPS_ADMIN_PASSWORD is required to seed the first admin")?;

    let hash = AuthService::hash_password(&password)?;
    let profile = Profile::create(
        &db.pool,
        Uuid::new_v4(),
        &CreateProfile {
            email: email.trim().to_lowercase(),
            name: "Administrator".to_string(),
            role: UserRole::Admin,
        },
        &hash,
    )
    .await?;
    info!(profile_id = %profile.id, "seeded initial admin");
    Ok(())
}
