use sqlx::PgPool;
use tracing::{debug, info};

use shared_database::{escape_like, DatabaseError};

use crate::models::{Practitioner, PractitionerError, PractitionerSearchQuery, UpdatePractitionerRequest};

#[derive(Clone)]
pub struct PractitionerService {
    pool: PgPool,
}

impl PractitionerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_practitioners(
        &self,
        query: &PractitionerSearchQuery,
    ) -> Result<Vec<Practitioner>, PractitionerError> {
        debug!("Searching practitioners with filters: {:?}", query);

        let practitioners = sqlx::query_as::<_, Practitioner>(
            r#"
            SELECT cin, last_name, first_name, phone, email, specialty
            FROM practitioners
            WHERE ($1::TEXT IS NULL OR specialty ILIKE $1 ESCAPE '\')
            ORDER BY last_name, first_name
            "#,
        )
        .bind(
            query
                .specialty
                .as_deref()
                .map(str::trim)
                .filter(|specialty| !specialty.is_empty())
                .map(escape_like),
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(practitioners)
    }

    pub async fn get_practitioner(&self, cin: &str) -> Result<Practitioner, PractitionerError> {
        debug!("Fetching practitioner profile: {}", cin);

        sqlx::query_as::<_, Practitioner>(
            "SELECT cin, last_name, first_name, phone, email, specialty FROM practitioners WHERE cin = $1",
        )
        .bind(cin)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PractitionerError::NotFound(cin.to_string()))
    }

    pub async fn create_practitioner(&self, practitioner: &Practitioner) -> Result<String, PractitionerError> {
        debug!("Creating practitioner profile for: {}", practitioner.full_name());

        sqlx::query(
            r#"
            INSERT INTO practitioners (cin, last_name, first_name, phone, email, specialty)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&practitioner.cin)
        .bind(&practitioner.last_name)
        .bind(&practitioner.first_name)
        .bind(practitioner.phone.as_deref())
        .bind(practitioner.email.as_deref())
        .bind(practitioner.specialty.as_deref())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        info!("Practitioner {} created", practitioner.cin);
        Ok(practitioner.cin.clone())
    }

    pub async fn update_practitioner(
        &self,
        cin: &str,
        changes: &UpdatePractitionerRequest,
    ) -> Result<Practitioner, PractitionerError> {
        debug!("Updating practitioner profile: {}", cin);

        let updated = sqlx::query_as::<_, Practitioner>(
            r#"
            UPDATE practitioners
            SET last_name  = COALESCE($2, last_name),
                first_name = COALESCE($3, first_name),
                phone      = COALESCE($4, phone),
                email      = COALESCE($5, email),
                specialty  = COALESCE($6, specialty)
            WHERE cin = $1
            RETURNING cin, last_name, first_name, phone, email, specialty
            "#,
        )
        .bind(cin)
        .bind(changes.last_name.as_deref())
        .bind(changes.first_name.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.specialty.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PractitionerError::NotFound(cin.to_string()))?;

        info!("Practitioner {} updated", cin);
        Ok(updated)
    }

    /// Delete practitioner profile (cascade removes their appointments)
    pub async fn delete_practitioner(&self, cin: &str) -> Result<u64, PractitionerError> {
        debug!("Deleting practitioner profile: {}", cin);

        let deleted = sqlx::query("DELETE FROM practitioners WHERE cin = $1")
            .bind(cin)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(PractitionerError::NotFound(cin.to_string()));
        }
        Ok(deleted)
    }
}
