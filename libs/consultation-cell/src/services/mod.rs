pub mod consultation;
pub mod exam;
pub mod prescription;

pub use consultation::ConsultationService;
pub use exam::ExamService;
pub use prescription::PrescriptionService;
