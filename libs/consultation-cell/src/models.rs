// libs/consultation-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use shared_database::DatabaseError;
use shared_models::datetime;
use shared_models::error::AppError;

pub const CONSULTATION_APPOINTMENT_FK: &str = "consultations_appointment_id_fkey";
pub const CONSULTATION_APPOINTMENT_KEY: &str = "consultations_appointment_id_key";
pub const PRESCRIPTION_CONSULTATION_FK: &str = "prescriptions_consultation_id_fkey";
pub const EXAM_CONSULTATION_FK: &str = "exams_consultation_id_fkey";

// ==============================================================================
// CONSULTATIONS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: i32,
    pub appointment_id: i32,
    pub consulted_at: NaiveDateTime,
    pub report: String,
    pub price: Option<f64>,
}

/// A consultation joined with the people of its appointment.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub consultation: Consultation,
    pub patient_cin: Option<String>,
    pub patient_name: Option<String>,
    pub practitioner_cin: Option<String>,
    pub practitioner_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConsultation {
    pub appointment_id: i32,
    pub consulted_at: NaiveDateTime,
    pub report: String,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsultationRequest {
    #[serde(alias = "idRdv")]
    pub appointment_id: i32,
    #[serde(default, alias = "dateConsult", deserialize_with = "datetime::lenient_option")]
    pub consulted_at: Option<NaiveDateTime>,
    #[serde(default, alias = "compteRendu")]
    pub report: Option<String>,
    #[serde(default, alias = "prix")]
    pub price: Option<f64>,
}

impl CreateConsultationRequest {
    /// Missing date means now; missing report means empty.
    pub fn validate(self, now: NaiveDateTime) -> Result<NewConsultation, ConsultationError> {
        validate_price(self.price)?;
        Ok(NewConsultation {
            appointment_id: self.appointment_id,
            consulted_at: self.consulted_at.unwrap_or(now),
            report: self.report.unwrap_or_default(),
            price: self.price,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsultationRequest {
    #[serde(default, alias = "idRdv")]
    pub appointment_id: Option<i32>,
    #[serde(default, alias = "dateConsult", deserialize_with = "datetime::lenient_option")]
    pub consulted_at: Option<NaiveDateTime>,
    #[serde(default, alias = "compteRendu")]
    pub report: Option<String>,
    #[serde(default, alias = "prix")]
    pub price: Option<f64>,
}

impl UpdateConsultationRequest {
    pub fn validate(self) -> Result<Self, ConsultationError> {
        validate_price(self.price)?;
        if self.appointment_id.is_none()
            && self.consulted_at.is_none()
            && self.report.is_none()
            && self.price.is_none()
        {
            return Err(ConsultationError::ValidationError("No fields to update".to_string()));
        }
        Ok(self)
    }
}

/// Raw query string of `GET /consultations/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationSearchQuery {
    pub patient: Option<String>,
    #[serde(alias = "praticien")]
    pub practitioner: Option<String>,
    pub date: Option<String>,
    #[serde(alias = "compteRendu")]
    pub report: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultationFilters {
    pub patient: Option<String>,
    pub practitioner: Option<String>,
    pub date: Option<NaiveDate>,
    pub report: Option<String>,
}

impl ConsultationSearchQuery {
    pub fn into_filters(self) -> Result<ConsultationFilters, ConsultationError> {
        let date = non_blank(self.date)
            .map(|raw| datetime::parse_date(&raw))
            .transpose()
            .map_err(ConsultationError::ValidationError)?;

        Ok(ConsultationFilters {
            patient: non_blank(self.patient),
            practitioner: non_blank(self.practitioner),
            date,
            report: non_blank(self.report),
        })
    }
}

// ==============================================================================
// PRESCRIPTIONS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: i32,
    pub consultation_id: i32,
    pub kind: String,
    pub dosage: String,
    pub prescribed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    #[serde(alias = "idConsult")]
    pub consultation_id: i32,
    #[serde(alias = "typePrescrire")]
    pub kind: String,
    #[serde(alias = "posologie")]
    pub dosage: String,
    #[serde(default, alias = "datePrescrire", deserialize_with = "datetime::date_option")]
    pub prescribed_on: Option<NaiveDate>,
}

impl CreatePrescriptionRequest {
    pub fn validate(self) -> Result<Self, ConsultationError> {
        Ok(Self {
            kind: required("kind", self.kind)?,
            dosage: required("dosage", self.dosage)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrescriptionRequest {
    #[serde(default, alias = "idConsult")]
    pub consultation_id: Option<i32>,
    #[serde(default, alias = "typePrescrire")]
    pub kind: Option<String>,
    #[serde(default, alias = "posologie")]
    pub dosage: Option<String>,
    #[serde(default, alias = "datePrescrire", deserialize_with = "datetime::date_option")]
    pub prescribed_on: Option<NaiveDate>,
}

impl UpdatePrescriptionRequest {
    pub fn validate(self) -> Result<Self, ConsultationError> {
        let request = Self {
            consultation_id: self.consultation_id,
            kind: self.kind.map(|kind| required("kind", kind)).transpose()?,
            dosage: self.dosage.map(|dosage| required("dosage", dosage)).transpose()?,
            prescribed_on: self.prescribed_on,
        };
        if request.consultation_id.is_none()
            && request.kind.is_none()
            && request.dosage.is_none()
            && request.prescribed_on.is_none()
        {
            return Err(ConsultationError::ValidationError("No fields to update".to_string()));
        }
        Ok(request)
    }
}

// ==============================================================================
// EXAMS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i32,
    pub consultation_id: i32,
    pub kind: String,
    pub exam_date: NaiveDate,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    #[serde(alias = "idConsult")]
    pub consultation_id: i32,
    #[serde(alias = "typeExamen")]
    pub kind: String,
    #[serde(alias = "dateExamen", deserialize_with = "datetime::date")]
    pub exam_date: NaiveDate,
    #[serde(default, alias = "resultat")]
    pub result: Option<String>,
}

impl CreateExamRequest {
    pub fn validate(self) -> Result<Self, ConsultationError> {
        Ok(Self {
            kind: required("kind", self.kind)?,
            result: non_blank(self.result),
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExamRequest {
    #[serde(default, alias = "idConsult")]
    pub consultation_id: Option<i32>,
    #[serde(default, alias = "typeExamen")]
    pub kind: Option<String>,
    #[serde(default, alias = "dateExamen", deserialize_with = "datetime::date_option")]
    pub exam_date: Option<NaiveDate>,
    #[serde(default, alias = "resultat")]
    pub result: Option<String>,
}

impl UpdateExamRequest {
    pub fn validate(self) -> Result<Self, ConsultationError> {
        let request = Self {
            consultation_id: self.consultation_id,
            kind: self.kind.map(|kind| required("kind", kind)).transpose()?,
            exam_date: self.exam_date,
            result: self.result,
        };
        if request.consultation_id.is_none()
            && request.kind.is_none()
            && request.exam_date.is_none()
            && request.result.is_none()
        {
            return Err(ConsultationError::ValidationError("No fields to update".to_string()));
        }
        Ok(request)
    }
}

fn validate_price(price: Option<f64>) -> Result<(), ConsultationError> {
    match price {
        Some(price) if !price.is_finite() || price < 0.0 => Err(ConsultationError::ValidationError(
            "price must be a non-negative amount".to_string(),
        )),
        _ => Ok(()),
    }
}

fn required(field: &str, value: String) -> Result<String, ConsultationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConsultationError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsultationError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DatabaseError> for ConsultationError {
    fn from(err: DatabaseError) -> Self {
        match &err {
            DatabaseError::ForeignKeyViolation { constraint, message } => {
                let reason = match constraint.as_deref() {
                    Some(CONSULTATION_APPOINTMENT_FK) => "Unknown appointment reference".to_string(),
                    Some(PRESCRIPTION_CONSULTATION_FK) | Some(EXAM_CONSULTATION_FK) => {
                        "Unknown consultation reference".to_string()
                    }
                    _ => format!("Invalid reference: {}", message),
                };
                ConsultationError::InvalidReference(reason)
            }
            DatabaseError::UniqueViolation { constraint, .. }
                if constraint.as_deref() == Some(CONSULTATION_APPOINTMENT_KEY) =>
            {
                ConsultationError::AlreadyExists("This appointment already has a consultation".to_string())
            }
            DatabaseError::UniqueViolation { message, .. } => ConsultationError::AlreadyExists(message.clone()),
            DatabaseError::CheckViolation { message, .. } => ConsultationError::ValidationError(message.clone()),
            _ => ConsultationError::Database(err.to_string()),
        }
    }
}

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::NotFound(_) => AppError::NotFound(err.to_string()),
            ConsultationError::InvalidReference(msg) => AppError::BadRequest(msg),
            ConsultationError::AlreadyExists(msg) => AppError::Conflict(msg),
            ConsultationError::ValidationError(msg) => AppError::BadRequest(msg),
            ConsultationError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_create_consultation_defaults() {
        let request: CreateConsultationRequest = serde_json::from_value(json!({ "appointmentId": 7 })).unwrap();
        let consultation = request.validate(noon()).unwrap();

        assert_eq!(consultation.appointment_id, 7);
        assert_eq!(consultation.consulted_at, noon());
        assert_eq!(consultation.report, "");
        assert_eq!(consultation.price, None);
    }

    #[test]
    fn test_create_consultation_with_front_office_keys() {
        let request: CreateConsultationRequest = serde_json::from_value(json!({
            "idRdv": 7,
            "dateConsult": "2024-03-02T09:15",
            "compteRendu": "RAS",
            "prix": 250.0
        }))
        .unwrap();
        let consultation = request.validate(noon()).unwrap();

        assert_eq!(consultation.report, "RAS");
        assert_eq!(consultation.price, Some(250.0));
        assert_eq!(consultation.consulted_at.date(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn test_negative_price_rejected() {
        let request: CreateConsultationRequest =
            serde_json::from_value(json!({ "appointmentId": 7, "price": -5 })).unwrap();
        assert_matches!(request.validate(noon()), Err(ConsultationError::ValidationError(_)));
    }

    #[test]
    fn test_search_filters() {
        let query = ConsultationSearchQuery {
            patient: Some("  ".to_string()),
            practitioner: Some("Haddad".to_string()),
            date: Some("2024-03-01".to_string()),
            report: None,
        };
        let filters = query.into_filters().unwrap();

        assert_eq!(filters.patient, None);
        assert_eq!(filters.practitioner.as_deref(), Some("Haddad"));
        assert_eq!(filters.date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_search_rejects_bad_date() {
        let query = ConsultationSearchQuery {
            date: Some("yesterday".to_string()),
            ..ConsultationSearchQuery::default()
        };
        assert_matches!(query.into_filters(), Err(ConsultationError::ValidationError(_)));
    }

    #[test]
    fn test_exam_requires_date() {
        let missing = serde_json::from_value::<CreateExamRequest>(json!({ "consultationId": 1, "kind": "IRM" }));
        assert!(missing.is_err());

        let exam: CreateExamRequest = serde_json::from_value(json!({
            "idConsult": 1,
            "typeExamen": "IRM",
            "dateExamen": "2024-03-05",
            "resultat": ""
        }))
        .unwrap();
        let exam = exam.validate().unwrap();
        assert_eq!(exam.result, None);
        assert_eq!(exam.kind, "IRM");
    }

    #[test]
    fn test_prescription_blank_dosage_rejected() {
        let request: CreatePrescriptionRequest = serde_json::from_value(json!({
            "consultationId": 1,
            "kind": "Paracetamol",
            "dosage": " ",
            "prescribedOn": ""
        }))
        .unwrap();
        assert_matches!(request.validate(), Err(ConsultationError::ValidationError(msg)) if msg.contains("dosage"));
    }

    #[test]
    fn test_unknown_consultation_reference_is_bad_request() {
        let err = ConsultationError::from(DatabaseError::ForeignKeyViolation {
            constraint: Some(EXAM_CONSULTATION_FK.to_string()),
            message: "violates foreign key constraint".to_string(),
        });
        assert_eq!(err, ConsultationError::InvalidReference("Unknown consultation reference".to_string()));
        assert_matches!(AppError::from(err), AppError::BadRequest(_));
    }

    #[test]
    fn test_second_consultation_is_conflict() {
        let err = ConsultationError::from(DatabaseError::UniqueViolation {
            constraint: Some(CONSULTATION_APPOINTMENT_KEY.to_string()),
            message: "duplicate key value".to_string(),
        });
        assert_matches!(AppError::from(err), AppError::Conflict(_));
    }
}
