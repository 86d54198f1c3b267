// src/models/mod.rs
pub mod notification;
pub mod request;
pub mod volunteer;

pub use notification::*;
pub use request::*;
pub use volunteer::*;
