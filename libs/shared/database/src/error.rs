use sqlx::error::ErrorKind;
use thiserror::Error;

use shared_models::error::AppError;

/// Store failures, classified by the constraint class PostgreSQL reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatabaseError {
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("unique violation: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("check violation: {message}")]
    CheckViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("row not found")]
    RowNotFound,

    #[error("database error: {0}")]
    Other(String),
}

impl DatabaseError {
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DatabaseError::ForeignKeyViolation { constraint, .. }
            | DatabaseError::UniqueViolation { constraint, .. }
            | DatabaseError::CheckViolation { constraint, .. } => constraint.as_deref(),
            _ => None,
        }
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DatabaseError::ForeignKeyViolation { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::RowNotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().map(str::to_string);
                let message = db_err.message().to_string();

                match db_err.kind() {
                    ErrorKind::ForeignKeyViolation => DatabaseError::ForeignKeyViolation { constraint, message },
                    ErrorKind::UniqueViolation => DatabaseError::UniqueViolation { constraint, message },
                    ErrorKind::CheckViolation => DatabaseError::CheckViolation { constraint, message },
                    _ => DatabaseError::Other(err.to_string()),
                }
            }
            _ => DatabaseError::Other(err.to_string()),
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ForeignKeyViolation { .. } => {
                AppError::ValidationError(format!("Referenced record does not exist ({})", err))
            }
            DatabaseError::UniqueViolation { .. } => AppError::Conflict(format!("Record already exists ({})", err)),
            DatabaseError::CheckViolation { .. } => AppError::ValidationError(err.to_string()),
            DatabaseError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            DatabaseError::Other(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_classified() {
        assert_eq!(DatabaseError::from(sqlx::Error::RowNotFound), DatabaseError::RowNotFound);
    }

    #[test]
    fn test_non_database_errors_fall_through() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DatabaseError::Other(_)));
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn test_app_error_mapping() {
        let fk = DatabaseError::ForeignKeyViolation {
            constraint: Some("appointments_patient_cin_fkey".to_string()),
            message: "violates foreign key constraint".to_string(),
        };
        assert_eq!(fk.constraint(), Some("appointments_patient_cin_fkey"));
        assert!(matches!(AppError::from(fk), AppError::ValidationError(_)));

        let unique = DatabaseError::UniqueViolation { constraint: None, message: "dup".to_string() };
        assert!(matches!(AppError::from(unique), AppError::Conflict(_)));

        assert!(matches!(AppError::from(DatabaseError::Other("boom".into())), AppError::Database(_)));
    }
}
