pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{consultation_routes, exam_routes, prescription_routes};
pub use services::{ConsultationService, ExamService, PrescriptionService};
