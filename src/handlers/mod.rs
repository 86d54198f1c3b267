pub mod dashboard_handler;
pub mod request_handler;
pub mod volunteer_handler;
