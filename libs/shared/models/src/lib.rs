pub mod auth;
pub mod datetime;
pub mod error;
