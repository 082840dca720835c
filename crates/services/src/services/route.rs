use chrono::NaiveDate;
use db::models::{
    route_item::{RouteItem, RouteItemView},
    work_order::WorkOrder,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::Actor,
    events::{ChangeOp, EventHub, Topic},
    notification::NotificationService,
};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("{0}")]
    Validation(String),
    #[error("work order is already on a route for that date")]
    Duplicate,
    #[error("route item not found")]
    NotFound,
    #[error("not allowed to modify this route item")]
    Forbidden,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct AddToRouteRequest {
    pub date: NaiveDate,
    pub route_number: i64,
    pub work_order_id: Uuid,
}

#[derive(Clone)]
pub struct RouteService {
    pool: SqlitePool,
    hub: EventHub,
    notifications: NotificationService,
}

impl RouteService {
    pub fn new(pool: SqlitePool, hub: EventHub, notifications: NotificationService) -> Self {
        Self {
            pool,
            hub,
            notifications,
        }
    }

    /// `add_work_order_to_route`: the technician is resolved here, never
    /// taken from the request. An admin puts the item on the work order's
    /// assignee (falling back to themselves); a technician always gets the
    /// item themselves.
    pub async fn add_to_route(
        &self,
        actor: Actor,
        request: AddToRouteRequest,
    ) -> Result<RouteItem, RouteError> {
        if !matches!(request.route_number, 1 | 2) {
            return Err(RouteError::Validation("route_number must be 1 or 2".into()));
        }
        let work_order = WorkOrder::find_by_id(&self.pool, request.work_order_id)
            .await?
            .ok_or_else(|| RouteError::Validation("work order does not exist".into()))?;

        let technician_id = if actor.is_admin() {
            work_order.assigned_to.unwrap_or(actor.id)
        } else {
            actor.id
        };

        let item = RouteItem::insert(
            &self.pool,
            request.date,
            request.route_number,
            work_order.id,
            technician_id,
        )
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => RouteError::Duplicate,
            _ => RouteError::Database(e),
        })?;

        info!(
            route_item_id = %item.id,
            route_date = %item.route_date,
            route_number = item.route_number,
            technician_id = %technician_id,
            "work order added to route"
        );

        if technician_id != actor.id {
            self.notifications
                .try_notify(
                    technician_id,
                    "route_item_added",
                    "Added to your route",
                    &format!("Route {} on {}", item.route_number, item.route_date),
                    Some(item.work_order_id),
                )
                .await;
        }
        self.hub
            .publish_change(Topic::RouteItems, ChangeOp::Insert, item.id);

        Ok(item)
    }

    /// `route_items_for_date`: admins see both lanes for everyone,
    /// technicians only their own items.
    pub async fn for_date(
        &self,
        actor: Actor,
        date: NaiveDate,
    ) -> Result<Vec<RouteItemView>, RouteError> {
        let scope = (!actor.is_admin()).then_some(actor.id);
        Ok(RouteItem::find_for_date(&self.pool, date, scope).await?)
    }

    /// Mark an item finished. Technicians may only finish their own items;
    /// `finished_at` never moves once set.
    pub async fn finish(&self, actor: Actor, item_id: Uuid) -> Result<RouteItem, RouteError> {
        let item = RouteItem::find_by_id(&self.pool, item_id)
            .await?
            .ok_or(RouteError::NotFound)?;

        if !actor.is_admin() && item.technician_id != actor.id {
            return Err(RouteError::Forbidden);
        }

        let finished = RouteItem::finish(&self.pool, item_id)
            .await?
            .ok_or(RouteError::NotFound)?;

        self.hub
            .publish_change(Topic::RouteItems, ChangeOp::Update, finished.id);
        Ok(finished)
    }
}
