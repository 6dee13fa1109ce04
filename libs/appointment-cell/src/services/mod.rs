pub mod confirmation;
pub mod memory;
pub mod postgres;
pub mod store;
