use chrono::NaiveDate;
use db::models::{route_item::RouteItem, task::Task, work_order::WorkOrder};
use serde::Serialize;
use sqlx::SqlitePool;
use ts_rs::TS;
use utils::date::today_local;

use super::auth::Actor;

/// Role-shaped landing-page counters. Admins get board-wide numbers,
/// technicians what affects them today.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardSummary {
    Admin {
        active_work_orders: i64,
        scheduled: i64,
        pending_close: i64,
        open_tasks: i64,
    },
    Technician {
        date: NaiveDate,
        route1_open: i64,
        route2_open: i64,
        open_tasks: i64,
    },
}

#[derive(Clone)]
pub struct DashboardService {
    pool: SqlitePool,
}

impl DashboardService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self, actor: Actor) -> Result<DashboardSummary, sqlx::Error> {
        let open_tasks = Task::count_open(&self.pool).await?;

        if actor.is_admin() {
            Ok(DashboardSummary::Admin {
                active_work_orders: WorkOrder::count_active(&self.pool).await?,
                scheduled: WorkOrder::count_with_status(&self.pool, "scheduled").await?,
                pending_close: WorkOrder::count_with_status(&self.pool, "pending_close").await?,
                open_tasks,
            })
        } else {
            let today = today_local();
            Ok(DashboardSummary::Technician {
                date: today,
                route1_open: RouteItem::count_open(&self.pool, today, actor.id, 1).await?,
                route2_open: RouteItem::count_open(&self.pool, today, actor.id, 2).await?,
                open_tasks,
            })
        }
    }
}
