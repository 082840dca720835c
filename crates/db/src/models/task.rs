use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Shared office todo. No workflow, just done/not-done.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub async fn find_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT id, title, done, created_at FROM tasks
             ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, title: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO tasks (id, title) VALUES ($1, $2)
             RETURNING id, title, done, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .fetch_one(pool)
        .await
    }

    pub async fn toggle(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "UPDATE tasks SET done = NOT done WHERE id = $1
             RETURNING id, title, done, created_at",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count_open(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE done = 0")
            .fetch_one(pool)
            .await
    }
}
