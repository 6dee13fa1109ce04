// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer, Serialize};

use shared_database::DatabaseError;
use shared_models::datetime;
use shared_models::error::AppError;

pub const PATIENT_FK: &str = "appointments_patient_cin_fkey";
pub const PRACTITIONER_FK: &str = "appointments_practitioner_cin_fkey";
pub const PARENT_FK: &str = "appointments_parent_id_fkey";
pub const CONSULTATION_APPOINTMENT_FK: &str = "consultations_appointment_id_fkey";
pub const CONSULTATION_APPOINTMENT_KEY: &str = "consultations_appointment_id_key";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i32,
    #[serde(rename = "patientRef")]
    pub patient_cin: String,
    #[serde(rename = "practitionerRef")]
    pub practitioner_cin: String,
    #[serde(rename = "dateTime")]
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(rename = "parentRef")]
    pub parent_id: Option<i32>,
}

/// Stored codes are the ones the clinic front office already uses; the English
/// names are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[default]
    #[serde(rename = "en_attente", alias = "pending")]
    Pending,
    #[serde(rename = "confirme", alias = "confirmed")]
    Confirmed,
    #[serde(rename = "annule", alias = "cancelled")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "en_attente",
            AppointmentStatus::Confirmed => "confirme",
            AppointmentStatus::Cancelled => "annule",
        }
    }

    /// Only a confirmed appointment must own a consultation.
    pub fn requires_consultation(&self) -> bool {
        matches!(self, AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en_attente" | "pending" => Ok(AppointmentStatus::Pending),
            "confirme" | "confirmed" => Ok(AppointmentStatus::Confirmed),
            "annule" | "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

/// Validated input for a new appointment row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub patient_cin: String,
    pub practitioner_cin: String,
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub parent_id: Option<i32>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentChanges {
    pub patient_cin: Option<String>,
    pub practitioner_cin: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub status: Option<AppointmentStatus>,
    pub parent_id: Option<i32>,
}

impl AppointmentChanges {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patient_cin.is_none()
            && self.practitioner_cin.is_none()
            && self.scheduled_at.is_none()
            && self.status.is_none()
            && self.parent_id.is_none()
    }

    /// Apply onto an existing appointment, COALESCE style.
    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(patient_cin) = &self.patient_cin {
            appointment.patient_cin = patient_cin.clone();
        }
        if let Some(practitioner_cin) = &self.practitioner_cin {
            appointment.practitioner_cin = practitioner_cin.clone();
        }
        if let Some(scheduled_at) = self.scheduled_at {
            appointment.scheduled_at = scheduled_at;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(parent_id) = self.parent_id {
            appointment.parent_id = Some(parent_id);
        }
    }
}

/// Result of a booking or an update: the appointment as committed, plus the
/// consultation created alongside it, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentOutcome {
    pub appointment: Appointment,
    pub consultation_id: Option<i32>,
}

impl AppointmentOutcome {
    pub fn consultation_created(&self) -> bool {
        self.consultation_id.is_some()
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(rename = "patientRef", alias = "cinPatient")]
    pub patient_cin: String,
    #[serde(rename = "practitionerRef", alias = "cinPraticien")]
    pub practitioner_cin: String,
    #[serde(rename = "dateTime", alias = "dateHeure", deserialize_with = "datetime::lenient")]
    pub scheduled_at: NaiveDateTime,
    #[serde(default, alias = "statut")]
    pub status: Option<AppointmentStatus>,
    #[serde(rename = "parentRef", alias = "idRdvParent", default, deserialize_with = "optional_id")]
    pub parent_id: Option<i32>,
}

impl BookAppointmentRequest {
    pub fn validate(self) -> Result<NewAppointment, AppointmentError> {
        Ok(NewAppointment {
            patient_cin: required_reference("patientRef", self.patient_cin)?,
            practitioner_cin: required_reference("practitionerRef", self.practitioner_cin)?,
            scheduled_at: self.scheduled_at,
            status: self.status.unwrap_or_default(),
            parent_id: self.parent_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    #[serde(rename = "patientRef", alias = "cinPatient", default)]
    pub patient_cin: Option<String>,
    #[serde(rename = "practitionerRef", alias = "cinPraticien", default)]
    pub practitioner_cin: Option<String>,
    #[serde(rename = "dateTime", alias = "dateHeure", default, deserialize_with = "datetime::lenient_option")]
    pub scheduled_at: Option<NaiveDateTime>,
    #[serde(default, alias = "statut")]
    pub status: Option<AppointmentStatus>,
    #[serde(rename = "parentRef", alias = "idRdvParent", default, deserialize_with = "optional_id")]
    pub parent_id: Option<i32>,
}

impl UpdateAppointmentRequest {
    pub fn validate(self, appointment_id: i32) -> Result<AppointmentChanges, AppointmentError> {
        let changes = AppointmentChanges {
            patient_cin: self
                .patient_cin
                .map(|cin| required_reference("patientRef", cin))
                .transpose()?,
            practitioner_cin: self
                .practitioner_cin
                .map(|cin| required_reference("practitionerRef", cin))
                .transpose()?,
            scheduled_at: self.scheduled_at,
            status: self.status,
            parent_id: self.parent_id,
        };

        if changes.is_empty() {
            return Err(AppointmentError::ValidationError("No fields to update".to_string()));
        }
        if changes.parent_id == Some(appointment_id) {
            return Err(AppointmentError::ValidationError(
                "An appointment cannot be its own parent".to_string(),
            ));
        }

        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient: Option<String>,
    pub practitioner: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentSearchQuery {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient.as_deref().map_or(true, |cin| appointment.patient_cin == cin)
            && self.practitioner.as_deref().map_or(true, |cin| appointment.practitioner_cin == cin)
            && self.status.map_or(true, |status| appointment.status == status)
    }
}

fn required_reference(field: &str, value: String) -> Result<String, AppointmentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppointmentError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Parent references arrive as numbers, numeric strings, `""` or `null`.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i32),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid appointment reference '{}'", text))),
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(i32),

    #[error("{0}")]
    InvalidReference(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage failure: {0}")]
    StoreFailure(String),
}

impl From<DatabaseError> for AppointmentError {
    fn from(err: DatabaseError) -> Self {
        match &err {
            DatabaseError::ForeignKeyViolation { constraint, message } => {
                let reason = match constraint.as_deref() {
                    Some(PATIENT_FK) => "Unknown patient reference".to_string(),
                    Some(PRACTITIONER_FK) => "Unknown practitioner reference".to_string(),
                    Some(PARENT_FK) => "Unknown parent appointment reference".to_string(),
                    _ => format!("Invalid reference: {}", message),
                };
                AppointmentError::InvalidReference(reason)
            }
            DatabaseError::CheckViolation { message, .. } => AppointmentError::ValidationError(message.clone()),
            _ => AppointmentError::StoreFailure(err.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::InvalidReference(msg) => AppError::ValidationError(msg),
            AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
            AppointmentError::StoreFailure(msg) => AppError::Internal(msg),
        }
    }
}
