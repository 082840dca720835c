//! Avatar storage on the local filesystem, served back under a public URL
//! prefix that gets persisted onto the profile row.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),
    #[error("file exceeds {MAX_AVATAR_BYTES} bytes")]
    TooLarge,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct StorageService {
    root: PathBuf,
    public_base: String,
}

impl StorageService {
    /// `root` is the directory served at `public_base` (e.g. "/files").
    pub fn new(root: PathBuf, public_base: String) -> Self {
        Self { root, public_base }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Write the avatar and return the public URL to persist on the profile.
    /// Old avatars are not reclaimed; uploads get fresh names.
    pub async fn save_avatar(
        &self,
        profile_id: Uuid,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(StorageError::TooLarge);
        }
        let extension = match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            other => return Err(StorageError::UnsupportedType(other.to_string())),
        };

        let file_name = format!("{}.{extension}", Uuid::new_v4());
        let dir = self.root.join("avatars").join(profile_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let url = format!("{}/avatars/{profile_id}/{file_name}", self.public_base);
        info!(%profile_id, url, "avatar stored");
        Ok(url)
    }
}
