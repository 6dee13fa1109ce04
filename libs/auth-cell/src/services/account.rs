use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::DatabaseError;
use shared_models::auth::{ROLE_ADMIN, ROLE_USER};
use shared_utils::jwt::issue_token;

use crate::models::{
    AdminAccount, AdminLoginResponse, AuthError, CredentialsRequest, StoredCredentials, UserAccount,
    UserLoginResponse, MAX_ADMINS,
};
use crate::services::password::{hash_password, verify_password};

#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
    config: Arc<AppConfig>,
}

impl AccountService {
    pub fn new(pool: PgPool, config: Arc<AppConfig>) -> Self {
        Self { pool, config }
    }

    fn token_for(&self, id: i32, email: &str, role: &str) -> Result<String, AuthError> {
        issue_token(
            &id.to_string(),
            email,
            role,
            &self.config.jwt_secret,
            self.config.jwt_ttl_minutes,
        )
        .map(|issued| issued.token)
        .map_err(AuthError::Credential)
    }

    // ==========================================================================
    // USERS
    // ==========================================================================

    /// New accounts start unapproved.
    pub async fn register(&self, request: &CredentialsRequest) -> Result<UserAccount, AuthError> {
        debug!("Registering account for {}", request.email);

        let password_hash = hash_password(&request.password)?;

        let account = sqlx::query_as::<_, UserAccount>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, is_approved
            "#,
        )
        .bind(&request.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        info!("Account {} registered, awaiting approval", account.id);
        Ok(account)
    }

    pub async fn login(&self, request: &CredentialsRequest) -> Result<UserLoginResponse, AuthError> {
        let stored = sqlx::query_as::<_, StoredCredentials>(
            "SELECT id, email, password_hash, is_approved FROM users WHERE email = $1",
        )
        .bind(&request.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let Some(stored) = stored else {
            warn!("Login attempt for unknown account {}", request.email);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&request.password, &stored.password_hash)? {
            warn!("Wrong password for account {}", stored.id);
            return Err(AuthError::InvalidCredentials);
        }

        if !stored.is_approved {
            warn!("Login refused for unapproved account {}", stored.id);
            return Err(AuthError::NotApproved);
        }

        let token = self.token_for(stored.id, &stored.email, ROLE_USER)?;
        Ok(UserLoginResponse {
            token,
            user: UserAccount {
                id: stored.id,
                email: stored.email,
                is_approved: stored.is_approved,
            },
        })
    }

    pub async fn list_users(&self) -> Result<Vec<UserAccount>, AuthError> {
        let users = sqlx::query_as::<_, UserAccount>("SELECT id, email, is_approved FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(users)
    }

    pub async fn list_pending_users(&self) -> Result<Vec<UserAccount>, AuthError> {
        let users = sqlx::query_as::<_, UserAccount>(
            "SELECT id, email, is_approved FROM users WHERE NOT is_approved ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(users)
    }

    pub async fn approve_user(&self, id: i32) -> Result<UserAccount, AuthError> {
        let account = sqlx::query_as::<_, UserAccount>(
            "UPDATE users SET is_approved = TRUE WHERE id = $1 RETURNING id, email, is_approved",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| AuthError::NotFound(format!("User {}", id)))?;

        info!("Account {} approved", id);
        Ok(account)
    }

    pub async fn delete_user(&self, id: i32) -> Result<u64, AuthError> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(AuthError::NotFound(format!("User {}", id)));
        }
        Ok(deleted)
    }

    // ==========================================================================
    // ADMINISTRATORS
    // ==========================================================================

    pub async fn admin_login(&self, request: &CredentialsRequest) -> Result<AdminLoginResponse, AuthError> {
        let stored: Option<(i32, String, String)> =
            sqlx::query_as("SELECT id, email, password_hash FROM admins WHERE email = $1")
                .bind(&request.email)
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::from)?;

        let Some((id, email, password_hash)) = stored else {
            warn!("Admin login attempt for unknown account {}", request.email);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&request.password, &password_hash)? {
            warn!("Wrong password for admin {}", id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.token_for(id, &email, ROLE_ADMIN)?;
        Ok(AdminLoginResponse {
            token,
            admin: AdminAccount { id, email },
        })
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminAccount>, AuthError> {
        let admins = sqlx::query_as::<_, AdminAccount>("SELECT id, email FROM admins ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(admins)
    }

    /// The cap is checked under a table lock so two concurrent creations
    /// cannot both pass it.
    pub async fn create_admin(&self, request: &CredentialsRequest) -> Result<AdminAccount, AuthError> {
        let password_hash = hash_password(&request.password)?;

        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        sqlx::query("LOCK TABLE admins IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        if count >= MAX_ADMINS {
            warn!("Refusing to create admin {}: limit reached", request.email);
            return Err(AuthError::AdminLimitReached);
        }

        let admin = sqlx::query_as::<_, AdminAccount>(
            "INSERT INTO admins (email, password_hash) VALUES ($1, $2) RETURNING id, email",
        )
        .bind(&request.email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        tx.commit().await.map_err(DatabaseError::from)?;

        info!("Administrator {} created", admin.id);
        Ok(admin)
    }

    pub async fn delete_admin(&self, id: i32) -> Result<u64, AuthError> {
        let deleted = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(AuthError::NotFound(format!("Admin {}", id)));
        }
        Ok(deleted)
    }

    /// Creates the first administrator from configuration when none exists.
    /// Returns whether one was created.
    pub async fn ensure_bootstrap_admin(&self) -> Result<bool, AuthError> {
        let Some((email, password)) = self.config.bootstrap_admin() else {
            debug!("No bootstrap administrator configured");
            return Ok(false);
        };

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        if existing > 0 {
            return Ok(false);
        }

        let request = CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
        .validate_new_account()?;

        self.create_admin(&request).await?;
        info!("Bootstrap administrator {} created", request.email);
        Ok(true)
    }
}
