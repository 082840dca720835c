use std::{env, path::PathBuf};

use anyhow::{Context, bail};

/// Process configuration, read once at startup. Missing required values are
/// fatal; nothing limps along without a database or a signing secret.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub files_dir: PathBuf,
    /// URL prefix the files dir is served under.
    pub public_files_base: String,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("FIELDOPS_DATABASE_URL")
            .context("FIELDOPS_DATABASE_URL is required (e.g. sqlite:fieldops.db)")?;
        let jwt_secret =
            env::var("FIELDOPS_JWT_SECRET").context("FIELDOPS_JWT_SECRET is required")?;
        if jwt_secret.trim().is_empty() {
            bail!("FIELDOPS_JWT_SECRET must not be empty");
        }

        let bind_addr =
            env::var("FIELDOPS_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8811".to_string());
        let files_dir = env::var("FIELDOPS_FILES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("files"));

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            files_dir,
            public_files_base: "/files".to_string(),
        })
    }
}
