use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, FromRow)]
struct TagLinkRow {
    work_order_id: Uuid,
    id: Uuid,
    name: String,
    color: String,
}

impl Tag {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT id, name, color FROM tags ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, name: &str, color: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO tags (id, name, color) VALUES ($1, $2, $3)
             RETURNING id, name, color",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(color)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Every (work order, tag) pair, grouped by work order. The tag table is
    /// small; one query beats a per-row lookup when assembling board views.
    pub async fn all_links(pool: &SqlitePool) -> Result<HashMap<Uuid, Vec<Tag>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TagLinkRow>(
            "SELECT wot.work_order_id, t.id, t.name, t.color
             FROM work_order_tags wot
             JOIN tags t ON t.id = wot.tag_id
             ORDER BY t.name ASC",
        )
        .fetch_all(pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            grouped.entry(row.work_order_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                color: row.color,
            });
        }
        Ok(grouped)
    }

    /// Replace the tag set on a work order.
    pub async fn replace_for_work_order(
        pool: &SqlitePool,
        work_order_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM work_order_tags WHERE work_order_id = $1")
            .bind(work_order_id)
            .execute(&mut *tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO work_order_tags (work_order_id, tag_id) VALUES ($1, $2)",
            )
            .bind(work_order_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}
