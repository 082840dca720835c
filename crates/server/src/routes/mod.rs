use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod events;
pub mod finance;
pub mod notifications;
pub mod profiles;
pub mod route_board;
pub mod tags;
pub mod tasks;
pub mod work_orders;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(profiles::router())
        .merge(clients::router())
        .merge(work_orders::router())
        .merge(route_board::router())
        .merge(tags::router())
        .merge(tasks::router())
        .merge(finance::router())
        .merge(notifications::router())
        .merge(dashboard::router())
        .merge(events::router());

    Router::new()
        .nest("/api", api)
        .nest_service("/files", ServeDir::new(state.storage.root()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
