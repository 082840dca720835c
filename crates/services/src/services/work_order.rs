//! Work-order operations. These were opaque stored procedures in the hosted
//! backend this service replaces; the multi-row transactions live here now.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    work_order::{NewWorkOrder, WorkOrder, WorkOrderView},
    work_order_status::WorkOrderStatus,
};
use db::models::client::Client;
use serde::Deserialize;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use utils::{date, phone::normalize_phone};
use uuid::Uuid;

use super::{
    auth::Actor,
    events::{ChangeOp, EventHub, Topic},
    notification::NotificationService,
};

pub const DEFAULT_STATUS: &str = "new";

#[derive(Debug, Error)]
pub enum WorkOrderError {
    #[error("{0}")]
    Validation(String),
    #[error("unknown status key: {0}")]
    UnknownStatus(String),
    #[error("work order not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateWorkOrderRequest {
    pub client_name: String,
    pub phone: String,
    pub address: String,
    pub service: Option<String>,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpdateWorkOrderRequest {
    pub client_name: String,
    pub phone: String,
    pub address: String,
    pub service: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub work_orders: Vec<WorkOrderView>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct AgendaWeek {
    pub monday: NaiveDate,
    pub days: Vec<AgendaDay>,
}

#[derive(Clone)]
pub struct WorkOrderService {
    pool: SqlitePool,
    hub: EventHub,
    notifications: NotificationService,
}

impl WorkOrderService {
    pub fn new(pool: SqlitePool, hub: EventHub, notifications: NotificationService) -> Self {
        Self {
            pool,
            hub,
            notifications,
        }
    }

    /// `create_work_order_with_client`: normalize the phone, upsert the
    /// client keyed on it, and insert the work order in one transaction.
    /// Only admins may assign; a technician's `assigned_to` is ignored.
    pub async fn create_with_client(
        &self,
        actor: Actor,
        request: CreateWorkOrderRequest,
    ) -> Result<WorkOrderView, WorkOrderError> {
        let client_name = require_trimmed(&request.client_name, "client name")?;
        let address = require_trimmed(&request.address, "address")?;
        let phone = normalize_phone(&request.phone);
        if phone.is_empty() {
            return Err(WorkOrderError::Validation("phone must contain digits".into()));
        }

        let assigned_to = if actor.is_admin() {
            request.assigned_to
        } else {
            None
        };

        let mut tx = self.pool.begin().await?;
        let client = Client::upsert_by_phone(&mut *tx, &client_name, &phone, &address).await?;
        let work_order = WorkOrder::insert(
            &mut *tx,
            Uuid::new_v4(),
            &NewWorkOrder {
                client_id: client.id,
                status: DEFAULT_STATUS.to_string(),
                service: clean_optional(request.service),
                description: clean_optional(request.description),
                scheduled_start: request.scheduled_start,
                estimated_minutes: request.estimated_minutes,
                assigned_to,
                created_by: actor.id,
            },
        )
        .await?;
        tx.commit().await?;

        info!(work_order_id = %work_order.id, client_id = %client.id, "work order created");

        if let Some(assignee) = assigned_to
            && assignee != actor.id
        {
            self.notifications
                .try_notify(
                    assignee,
                    "work_order_assigned",
                    "Work order assigned to you",
                    &format!("{client_name} — {}", work_order.service.as_deref().unwrap_or("no service")),
                    Some(work_order.id),
                )
                .await;
        }
        self.hub
            .publish_change(Topic::WorkOrders, ChangeOp::Insert, work_order.id);

        self.view(work_order.id).await
    }

    /// `update_work_order_and_client`: edit both rows in one transaction.
    /// A changed phone de-duplicates onto the matching client row, moving
    /// the work order's client pointer with it.
    pub async fn update_with_client(
        &self,
        actor: Actor,
        id: Uuid,
        request: UpdateWorkOrderRequest,
    ) -> Result<WorkOrderView, WorkOrderError> {
        let existing = WorkOrder::find_by_id(&self.pool, id)
            .await?
            .ok_or(WorkOrderError::NotFound)?;

        let client_name = require_trimmed(&request.client_name, "client name")?;
        let address = require_trimmed(&request.address, "address")?;
        let phone = normalize_phone(&request.phone);
        if phone.is_empty() {
            return Err(WorkOrderError::Validation("phone must contain digits".into()));
        }
        if !WorkOrderStatus::exists(&self.pool, &request.status).await? {
            return Err(WorkOrderError::UnknownStatus(request.status));
        }

        // Assignment stays admin-only; technicians keep the existing value.
        let assigned_to = if actor.is_admin() {
            request.assigned_to
        } else {
            existing.assigned_to
        };

        let mut tx = self.pool.begin().await?;
        let client = Client::upsert_by_phone(&mut *tx, &client_name, &phone, &address).await?;
        let updated = WorkOrder::update(
            &mut *tx,
            id,
            client.id,
            &request.status,
            clean_optional(request.service).as_deref(),
            clean_optional(request.description).as_deref(),
            request.scheduled_start,
            request.estimated_minutes,
            assigned_to,
        )
        .await?;
        tx.commit().await?;

        if let Some(assignee) = assigned_to
            && existing.assigned_to != Some(assignee)
            && assignee != actor.id
        {
            self.notifications
                .try_notify(
                    assignee,
                    "work_order_assigned",
                    "Work order assigned to you",
                    &format!("{client_name} — {}", updated.service.as_deref().unwrap_or("no service")),
                    Some(updated.id),
                )
                .await;
        }
        self.hub
            .publish_change(Topic::WorkOrders, ChangeOp::Update, updated.id);

        self.view(updated.id).await
    }

    /// Kanban move: set the status to another column's key.
    pub async fn move_status(&self, id: Uuid, status: &str) -> Result<WorkOrderView, WorkOrderError> {
        if !WorkOrderStatus::exists(&self.pool, status).await? {
            return Err(WorkOrderError::UnknownStatus(status.to_string()));
        }
        let changed = WorkOrder::update_status(&self.pool, id, status).await?;
        if changed == 0 {
            return Err(WorkOrderError::NotFound);
        }
        self.hub
            .publish_change(Topic::WorkOrders, ChangeOp::Update, id);
        self.view(id).await
    }

    pub async fn board(&self, _actor: Actor) -> Result<Vec<WorkOrderView>, WorkOrderError> {
        Ok(WorkOrder::find_view_all(&self.pool).await?)
    }

    /// `work_orders_for_date`: admins see the whole day, technicians only
    /// what is assigned to or created by them.
    pub async fn for_date(
        &self,
        actor: Actor,
        date: NaiveDate,
    ) -> Result<Vec<WorkOrderView>, WorkOrderError> {
        let scope = (!actor.is_admin()).then_some(actor.id);
        Ok(WorkOrder::find_for_date(&self.pool, date, scope).await?)
    }

    /// Mon–Fri agenda around `date`. A weekend date snaps to the Monday of
    /// its week before the week is assembled.
    pub async fn agenda_week(
        &self,
        actor: Actor,
        requested: NaiveDate,
    ) -> Result<AgendaWeek, WorkOrderError> {
        let anchor = date::normalize_to_weekday(requested);
        let monday = date::start_of_week_monday(anchor);

        let mut days = Vec::with_capacity(5);
        for day in date::week_days_mon_fri(anchor) {
            days.push(AgendaDay {
                date: day,
                work_orders: self.for_date(actor, day).await?,
            });
        }
        Ok(AgendaWeek { monday, days })
    }

    async fn view(&self, id: Uuid) -> Result<WorkOrderView, WorkOrderError> {
        WorkOrder::find_view_by_id(&self.pool, id)
            .await?
            .ok_or(WorkOrderError::NotFound)
    }
}

fn require_trimmed(value: &str, field: &str) -> Result<String, WorkOrderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkOrderError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
