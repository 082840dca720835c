use db::DBService;
use services::services::{
    auth::AuthService, dashboard::DashboardService, events::EventHub, finance::FinanceService,
    notification::NotificationService, route::RouteService, storage::StorageService,
    work_order::WorkOrderService,
};

use crate::ServerConfig;

/// Everything the handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub events: EventHub,
    pub auth: AuthService,
    pub work_orders: WorkOrderService,
    pub routes: RouteService,
    pub finance: FinanceService,
    pub notifications: NotificationService,
    pub dashboard: DashboardService,
    pub storage: StorageService,
}

impl AppState {
    pub fn new(db: DBService, config: &ServerConfig) -> Self {
        let events = EventHub::default();
        let notifications = NotificationService::new(db.pool.clone(), events.clone());
        Self {
            auth: AuthService::new(db.pool.clone(), config.jwt_secret.clone()),
            work_orders: WorkOrderService::new(
                db.pool.clone(),
                events.clone(),
                notifications.clone(),
            ),
            routes: RouteService::new(db.pool.clone(), events.clone(), notifications.clone()),
            finance: FinanceService::new(db.pool.clone()),
            dashboard: DashboardService::new(db.pool.clone()),
            storage: StorageService::new(
                config.files_dir.clone(),
                config.public_files_base.clone(),
            ),
            notifications,
            events,
            db,
        }
    }
}
