use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

use crate::services::password::check_password_length;

pub const MAX_ADMINS: i64 = 3;

// ==============================================================================
// ACCOUNTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: i32,
    pub email: String,
    pub is_approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminAccount {
    pub id: i32,
    pub email: String,
}

/// Row shape used only while checking a login attempt.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StoredCredentials {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub is_approved: bool,
}

// ==============================================================================
// REQUESTS / RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl CredentialsRequest {
    /// Shape check shared by every login form.
    pub fn validate_login(self) -> Result<Self, AuthError> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() || self.password.is_empty() {
            return Err(AuthError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }
        Ok(Self { email, password: self.password })
    }

    /// Login checks plus the password policy, for new accounts.
    pub fn validate_new_account(self) -> Result<Self, AuthError> {
        let request = self.validate_login()?;
        if !request.email.contains('@') {
            return Err(AuthError::ValidationError("email is not valid".to_string()));
        }
        check_password_length(&request.password).map_err(AuthError::ValidationError)?;
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct UserLoginResponse {
    pub token: String,
    pub user: UserAccount,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub admin: AdminAccount,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is awaiting administrator approval")]
    NotApproved,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("At most {} administrators are allowed", MAX_ADMINS)]
    AdminLimitReached,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        match err.constraint() {
            Some("users_email_key") if err.is_unique_violation() => {
                AuthError::AlreadyExists("An account with this email already exists".to_string())
            }
            Some("admins_email_key") if err.is_unique_violation() => {
                AuthError::AlreadyExists("An administrator with this email already exists".to_string())
            }
            _ => AuthError::Database(err.to_string()),
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::Credential(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::NotApproved => AppError::Forbidden(err.to_string()),
            AuthError::NotFound(_) => AppError::NotFound(err.to_string()),
            AuthError::AlreadyExists(msg) => AppError::Conflict(msg),
            AuthError::AdminLimitReached => AppError::BadRequest(err.to_string()),
            AuthError::ValidationError(msg) => AppError::BadRequest(msg),
            AuthError::Credential(msg) => AppError::Internal(msg),
            AuthError::Database(msg) => AppError::Database(msg),
        }
    }
}
