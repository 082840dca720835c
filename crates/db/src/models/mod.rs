pub mod client;
pub mod finance_entry;
pub mod notification;
pub mod profile;
pub mod route_item;
pub mod tag;
pub mod task;
pub mod work_order;
pub mod work_order_status;
