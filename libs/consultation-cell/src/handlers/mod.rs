pub mod consultation;
pub mod exam;
pub mod prescription;
