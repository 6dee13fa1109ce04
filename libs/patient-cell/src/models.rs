use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub cin: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub address: Option<String>,
    pub email: Option<String>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "Homme", alias = "male", alias = "M")]
    Male,
    #[serde(rename = "Femme", alias = "female", alias = "F")]
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Homme",
            Sex::Female => "Femme",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Homme" | "male" | "M" => Ok(Sex::Male),
            "Femme" | "female" | "F" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub cin: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreatePatientRequest {
    pub fn validate(self) -> Result<Patient, PatientError> {
        if self.age < 0 {
            return Err(PatientError::ValidationError("age must not be negative".to_string()));
        }

        Ok(Patient {
            cin: required("cin", self.cin)?,
            first_name: required("firstName", self.first_name)?,
            last_name: required("lastName", self.last_name)?,
            age: self.age,
            address: blank_to_none(self.address),
            email: blank_to_none(self.email),
            sex: self.sex,
            phone: blank_to_none(self.phone),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
}

impl UpdatePatientRequest {
    pub fn validate(self) -> Result<Self, PatientError> {
        if self.age.is_some_and(|age| age < 0) {
            return Err(PatientError::ValidationError("age must not be negative".to_string()));
        }

        let request = Self {
            first_name: self.first_name.map(|name| required("firstName", name)).transpose()?,
            last_name: self.last_name.map(|name| required("lastName", name)).transpose()?,
            age: self.age,
            address: blank_to_none(self.address),
            email: blank_to_none(self.email),
            sex: self.sex,
            phone: blank_to_none(self.phone),
        };

        if request.is_empty() {
            return Err(PatientError::ValidationError("No fields to update".to_string()));
        }
        Ok(request)
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.address.is_none()
            && self.email.is_none()
            && self.sex.is_none()
            && self.phone.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientSearchQuery {
    #[serde(alias = "nom")]
    pub name: Option<String>,
}

fn required(field: &str, value: String) -> Result<String, PatientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PatientError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatientError {
    #[error("Patient {0} not found")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for PatientError {
    fn from(err: DatabaseError) -> Self {
        match &err {
            DatabaseError::UniqueViolation { constraint, .. } => {
                let reason = match constraint.as_deref() {
                    Some("patients_pkey") => "A patient with this CIN already exists",
                    Some("patients_email_key") => "A patient with this email already exists",
                    Some("patients_phone_key") => "A patient with this phone number already exists",
                    _ => "Patient already exists",
                };
                PatientError::AlreadyExists(reason.to_string())
            }
            DatabaseError::CheckViolation { message, .. } => PatientError::ValidationError(message.clone()),
            _ => PatientError::DatabaseError(err.to_string()),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(_) => AppError::NotFound(err.to_string()),
            PatientError::AlreadyExists(msg) => AppError::Conflict(msg),
            PatientError::ValidationError(msg) => AppError::BadRequest(msg),
            PatientError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
