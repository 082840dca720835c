use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// One kanban column. The set is data, not code: the board renders whatever
/// rows exist here, in `sort_order`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WorkOrderStatus {
    pub key: String,
    pub label: String,
    pub sort_order: i64,
    pub color: String,
    pub is_terminal: bool,
}

impl WorkOrderStatus {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT key, label, sort_order, color, is_terminal
             FROM work_order_statuses ORDER BY sort_order ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn exists(pool: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_order_statuses WHERE key = $1",
        )
        .bind(key)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}
