use serde::{Deserialize, Serialize};

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    pub cin: String,
    pub last_name: String,
    pub first_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
}

impl Practitioner {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePractitionerRequest {
    pub cin: String,
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl CreatePractitionerRequest {
    pub fn validate(self) -> Result<Practitioner, PractitionerError> {
        Ok(Practitioner {
            cin: required("cin", self.cin)?,
            last_name: required("lastName", self.last_name)?,
            first_name: required("firstName", self.first_name)?,
            phone: optional(self.phone),
            email: optional(self.email),
            specialty: optional(self.specialty),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePractitionerRequest {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
}

impl UpdatePractitionerRequest {
    pub fn validate(self) -> Result<Self, PractitionerError> {
        let request = Self {
            last_name: self.last_name.map(|name| required("lastName", name)).transpose()?,
            first_name: self.first_name.map(|name| required("firstName", name)).transpose()?,
            phone: optional(self.phone),
            email: optional(self.email),
            specialty: optional(self.specialty),
        };

        let empty = request.last_name.is_none()
            && request.first_name.is_none()
            && request.phone.is_none()
            && request.email.is_none()
            && request.specialty.is_none();
        if empty {
            return Err(PractitionerError::ValidationError("No fields to update".to_string()));
        }

        Ok(request)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PractitionerSearchQuery {
    pub specialty: Option<String>,
}

fn required(field: &str, value: String) -> Result<String, PractitionerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PractitionerError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Error types specific to practitioner operations
#[derive(Debug, Clone, PartialEq)]
pub enum PractitionerError {
    NotFound(String),
    Duplicate(String),
    ValidationError(String),
    Database(String),
}

impl std::fmt::Display for PractitionerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PractitionerError::NotFound(cin) => write!(f, "Practitioner {} not found", cin),
            PractitionerError::Duplicate(msg) => write!(f, "{}", msg),
            PractitionerError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            PractitionerError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for PractitionerError {}

impl From<DatabaseError> for PractitionerError {
    fn from(err: DatabaseError) -> Self {
        match err.constraint() {
            Some("practitioners_pkey") => {
                PractitionerError::Duplicate("A practitioner with this CIN already exists".to_string())
            }
            Some("practitioners_email_key") => {
                PractitionerError::Duplicate("A practitioner with this email already exists".to_string())
            }
            Some("practitioners_phone_key") => {
                PractitionerError::Duplicate("A practitioner with this phone number already exists".to_string())
            }
            _ => PractitionerError::Database(err.to_string()),
        }
    }
}

impl From<PractitionerError> for AppError {
    fn from(err: PractitionerError) -> Self {
        match err {
            PractitionerError::NotFound(_) => AppError::NotFound(err.to_string()),
            PractitionerError::Duplicate(msg) => AppError::Conflict(msg),
            PractitionerError::ValidationError(msg) => AppError::BadRequest(msg),
            PractitionerError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_create_request_validation() {
        let request: CreatePractitionerRequest = serde_json::from_value(json!({
            "cin": "D1",
            "lastName": "Haddad",
            "firstName": "Karim",
            "specialty": "Cardiologie",
            "phone": " "
        }))
        .unwrap();

        let practitioner = request.validate().unwrap();
        assert_eq!(practitioner.full_name(), "Karim Haddad");
        assert_eq!(practitioner.phone, None);
        assert_eq!(practitioner.specialty.as_deref(), Some("Cardiologie"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let request: CreatePractitionerRequest = serde_json::from_value(json!({
            "cin": "D1",
            "lastName": "",
            "firstName": "Karim"
        }))
        .unwrap();

        assert_matches!(request.validate(), Err(PractitionerError::ValidationError(msg)) if msg.contains("lastName"));
    }

    #[test]
    fn test_serialized_field_names() {
        let practitioner = Practitioner {
            cin: "D1".to_string(),
            last_name: "Haddad".to_string(),
            first_name: "Karim".to_string(),
            phone: None,
            email: None,
            specialty: None,
        };
        let value = serde_json::to_value(&practitioner).unwrap();
        assert_eq!(value["lastName"], "Haddad");
        assert_eq!(value["firstName"], "Karim");
    }

    #[test]
    fn test_duplicate_cin_is_conflict() {
        let err = PractitionerError::from(DatabaseError::UniqueViolation {
            constraint: Some("practitioners_pkey".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        });
        assert_matches!(AppError::from(err), AppError::Conflict(_));
    }
}
