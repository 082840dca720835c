use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::tag::Tag;

#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct WorkOrder {
    pub id: Uuid,
    pub client_id: Uuid,
    pub status: String,
    pub service: Option<String>,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Denormalized row the board and agenda render: work order plus client
/// fields, assignee name, and tag list.
#[derive(Debug, Clone, Serialize, TS)]
pub struct WorkOrderView {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub phone: String,
    pub address: String,
    pub status: String,
    pub service: Option<String>,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, FromRow)]
struct ViewRow {
    id: Uuid,
    client_id: Uuid,
    client_name: String,
    phone: String,
    address: String,
    status: String,
    service: Option<String>,
    description: Option<String>,
    scheduled_start: Option<DateTime<Utc>>,
    estimated_minutes: Option<i64>,
    assigned_to: Option<Uuid>,
    assigned_to_name: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ViewRow {
    fn into_view(self, tags: Vec<Tag>) -> WorkOrderView {
        WorkOrderView {
            id: self.id,
            client_id: self.client_id,
            client_name: self.client_name,
            phone: self.phone,
            address: self.address,
            status: self.status,
            service: self.service,
            description: self.description,
            scheduled_start: self.scheduled_start,
            estimated_minutes: self.estimated_minutes,
            assigned_to: self.assigned_to,
            assigned_to_name: self.assigned_to_name,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            tags,
        }
    }
}

const VIEW_SELECT: &str = "SELECT wo.id, wo.client_id, c.name AS client_name, c.phone, c.address,
        wo.status, wo.service, wo.description, wo.scheduled_start, wo.estimated_minutes,
        wo.assigned_to, p.name AS assigned_to_name, wo.created_by, wo.created_at, wo.updated_at
 FROM work_orders wo
 JOIN clients c ON c.id = wo.client_id
 LEFT JOIN profiles p ON p.id = wo.assigned_to";

/// Fields a work-order insert needs beyond what the service layer derives.
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub client_id: Uuid,
    pub status: String,
    pub service: Option<String>,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
}

impl WorkOrder {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT id, client_id, status, service, description, scheduled_start,
                    estimated_minutes, assigned_to, created_by, created_at, updated_at
             FROM work_orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_view_all(pool: &SqlitePool) -> Result<Vec<WorkOrderView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ViewRow>(&format!(
            "{VIEW_SELECT} ORDER BY wo.created_at DESC"
        ))
        .fetch_all(pool)
        .await?;
        Self::attach_tags(pool, rows).await
    }

    pub async fn find_view_by_id(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<WorkOrderView>, sqlx::Error> {
        let row = sqlx::query_as::<_, ViewRow>(&format!("{VIEW_SELECT} WHERE wo.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        match row {
            Some(row) => Ok(Self::attach_tags(pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Work orders scheduled on a civil date. `visible_to` narrows the result
    /// to rows assigned to or created by that profile (the technician scope).
    pub async fn find_for_date(
        pool: &SqlitePool,
        date: NaiveDate,
        visible_to: Option<Uuid>,
    ) -> Result<Vec<WorkOrderView>, sqlx::Error> {
        let rows = match visible_to {
            Some(profile_id) => {
                sqlx::query_as::<_, ViewRow>(&format!(
                    "{VIEW_SELECT}
                     WHERE wo.scheduled_start IS NOT NULL AND date(wo.scheduled_start) = $1
                       AND (wo.assigned_to = $2 OR wo.created_by = $2)
                     ORDER BY wo.scheduled_start ASC"
                ))
                .bind(date)
                .bind(profile_id)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ViewRow>(&format!(
                    "{VIEW_SELECT}
                     WHERE wo.scheduled_start IS NOT NULL AND date(wo.scheduled_start) = $1
                     ORDER BY wo.scheduled_start ASC"
                ))
                .bind(date)
                .fetch_all(pool)
                .await?
            }
        };
        Self::attach_tags(pool, rows).await
    }

    pub async fn insert<'e, E>(executor: E, id: Uuid, data: &NewWorkOrder) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Self>(
            "INSERT INTO work_orders
                 (id, client_id, status, service, description, scheduled_start,
                  estimated_minutes, assigned_to, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id, client_id, status, service, description, scheduled_start,
                       estimated_minutes, assigned_to, created_by, created_at, updated_at",
        )
        .bind(id)
        .bind(data.client_id)
        .bind(&data.status)
        .bind(&data.service)
        .bind(&data.description)
        .bind(data.scheduled_start)
        .bind(data.estimated_minutes)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    /// Full update used by the edit form. The client pointer can move when
    /// the edited phone de-duplicates onto another client row.
    #[allow(clippy::too_many_arguments)]
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        client_id: Uuid,
        status: &str,
        service: Option<&str>,
        description: Option<&str>,
        scheduled_start: Option<DateTime<Utc>>,
        estimated_minutes: Option<i64>,
        assigned_to: Option<Uuid>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Self>(
            "UPDATE work_orders
             SET client_id = $2, status = $3, service = $4, description = $5,
                 scheduled_start = $6, estimated_minutes = $7, assigned_to = $8,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING id, client_id, status, service, description, scheduled_start,
                       estimated_minutes, assigned_to, created_by, created_at, updated_at",
        )
        .bind(id)
        .bind(client_id)
        .bind(status)
        .bind(service)
        .bind(description)
        .bind(scheduled_start)
        .bind(estimated_minutes)
        .bind(assigned_to)
        .fetch_one(executor)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE work_orders SET status = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Count of work orders whose status is not terminal.
    pub async fn count_active(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_orders wo
             JOIN work_order_statuses s ON s.key = wo.status
             WHERE s.is_terminal = 0",
        )
        .fetch_one(pool)
        .await
    }

    pub async fn count_with_status(pool: &SqlitePool, status: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM work_orders WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }

    async fn attach_tags(
        pool: &SqlitePool,
        rows: Vec<ViewRow>,
    ) -> Result<Vec<WorkOrderView>, sqlx::Error> {
        let mut by_order: HashMap<Uuid, Vec<Tag>> = Tag::all_links(pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = by_order.remove(&row.id).unwrap_or_default();
                row.into_view(tags)
            })
            .collect())
    }
}
