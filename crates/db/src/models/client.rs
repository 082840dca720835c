use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// `%` and `_` in user input match literally, not as LIKE wildcards.
fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Client {
    /// Newest first, optionally filtered by a case-insensitive name fragment.
    pub async fn search(
        pool: &SqlitePool,
        name_filter: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match name_filter.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let pattern = format!("%{}%", escape_like(q));
                sqlx::query_as::<_, Self>(
                    "SELECT id, name, phone, address, created_at FROM clients
                     WHERE name LIKE $1 ESCAPE '\\'
                     ORDER BY created_at DESC LIMIT $2",
                )
                .bind(pattern)
                .bind(limit)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Self>(
                    "SELECT id, name, phone, address, created_at FROM clients
                     ORDER BY created_at DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT id, name, phone, address, created_at FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a client, or update name/address on the existing row with the
    /// same phone. The phone is the de-duplication key and must already be
    /// normalized to digits by the caller.
    pub async fn upsert_by_phone<'e, E>(
        executor: E,
        name: &str,
        phone: &str,
        address: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Self>(
            "INSERT INTO clients (id, name, phone, address) VALUES ($1, $2, $3, $4)
             ON CONFLICT(phone) DO UPDATE SET name = excluded.name, address = excluded.address
             RETURNING id, name, phone, address, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(phone)
        .bind(address)
        .fetch_one(executor)
        .await
    }
}
