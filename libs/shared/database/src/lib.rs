pub mod error;
pub mod pattern;
pub mod postgres;

pub use error::DatabaseError;
pub use pattern::{contains_pattern, escape_like};
pub use postgres::{connect, connect_lazy, ping, run_migrations};
