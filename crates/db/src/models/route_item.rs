use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::work_order::{WorkOrder, WorkOrderView};

#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct RouteItem {
    pub id: Uuid,
    pub route_date: NaiveDate,
    pub route_number: i64,
    pub work_order_id: Uuid,
    pub technician_id: Uuid,
    pub done: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Route item with its work order embedded, as the dual-lane board renders it.
#[derive(Debug, Clone, Serialize, TS)]
pub struct RouteItemView {
    pub id: Uuid,
    pub route_date: NaiveDate,
    pub route_number: i64,
    pub technician_id: Uuid,
    pub done: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub work_order: WorkOrderView,
}

const ITEM_COLUMNS: &str =
    "id, route_date, route_number, work_order_id, technician_id, done, finished_at, created_at";

impl RouteItem {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {ITEM_COLUMNS} FROM route_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Items for a civil date, lane order then creation order. `visible_to`
    /// narrows to one technician's items.
    pub async fn find_for_date(
        pool: &SqlitePool,
        date: NaiveDate,
        visible_to: Option<Uuid>,
    ) -> Result<Vec<RouteItemView>, sqlx::Error> {
        let items = match visible_to {
            Some(technician_id) => {
                sqlx::query_as::<_, Self>(&format!(
                    "SELECT {ITEM_COLUMNS} FROM route_items
                     WHERE route_date = $1 AND technician_id = $2
                     ORDER BY route_number ASC, created_at ASC"
                ))
                .bind(date)
                .bind(technician_id)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Self>(&format!(
                    "SELECT {ITEM_COLUMNS} FROM route_items
                     WHERE route_date = $1
                     ORDER BY route_number ASC, created_at ASC"
                ))
                .bind(date)
                .fetch_all(pool)
                .await?
            }
        };

        let mut views = Vec::with_capacity(items.len());
        for item in items {
            if let Some(work_order) = WorkOrder::find_view_by_id(pool, item.work_order_id).await? {
                views.push(RouteItemView {
                    id: item.id,
                    route_date: item.route_date,
                    route_number: item.route_number,
                    technician_id: item.technician_id,
                    done: item.done,
                    finished_at: item.finished_at,
                    work_order,
                });
            }
        }
        Ok(views)
    }

    pub async fn insert<'e, E>(
        executor: E,
        date: NaiveDate,
        route_number: i64,
        work_order_id: Uuid,
        technician_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO route_items (id, route_date, route_number, work_order_id, technician_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(route_number)
        .bind(work_order_id)
        .bind(technician_id)
        .fetch_one(executor)
        .await
    }

    /// Mark done. `finished_at` is monotonic: once set it never changes, even
    /// if the item is finished twice.
    pub async fn finish(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE route_items
             SET done = 1, finished_at = COALESCE(finished_at, $2)
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn count_open(
        pool: &SqlitePool,
        date: NaiveDate,
        technician_id: Uuid,
        route_number: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM route_items
             WHERE route_date = $1 AND technician_id = $2 AND route_number = $3 AND done = 0",
        )
        .bind(date)
        .bind(technician_id)
        .bind(route_number)
        .fetch_one(pool)
        .await
    }
}
