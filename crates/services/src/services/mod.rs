pub mod auth;
pub mod dashboard;
pub mod events;
pub mod finance;
pub mod notification;
pub mod route;
pub mod storage;
pub mod work_order;
