pub mod filter;
pub mod matching_service;
pub mod notification_service;
pub mod request_service;
pub mod store_service;
pub mod volunteer_service;
