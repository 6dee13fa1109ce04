pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::appointment_routes;
pub use services::confirmation::AppointmentConfirmationService;
pub use services::memory::InMemoryAppointmentStore;
pub use services::postgres::PgAppointmentStore;
pub use services::store::{AppointmentStore, AppointmentTransaction};
