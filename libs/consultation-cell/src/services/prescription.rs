use sqlx::PgPool;
use tracing::debug;

use shared_database::DatabaseError;

use crate::models::{ConsultationError, CreatePrescriptionRequest, Prescription, UpdatePrescriptionRequest};

#[derive(Clone)]
pub struct PrescriptionService {
    pool: PgPool,
}

impl PrescriptionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_prescriptions(&self) -> Result<Vec<Prescription>, ConsultationError> {
        let prescriptions = sqlx::query_as::<_, Prescription>(
            "SELECT id, consultation_id, kind, dosage, prescribed_on FROM prescriptions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(prescriptions)
    }

    pub async fn get_prescription(&self, id: i32) -> Result<Prescription, ConsultationError> {
        sqlx::query_as::<_, Prescription>(
            "SELECT id, consultation_id, kind, dosage, prescribed_on FROM prescriptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| ConsultationError::NotFound(format!("Prescription {}", id)))
    }

    pub async fn create_prescription(&self, request: &CreatePrescriptionRequest) -> Result<i32, ConsultationError> {
        debug!("Adding prescription to consultation {}", request.consultation_id);

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO prescriptions (consultation_id, kind, dosage, prescribed_on)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(request.consultation_id)
        .bind(&request.kind)
        .bind(&request.dosage)
        .bind(request.prescribed_on)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(id)
    }

    pub async fn update_prescription(
        &self,
        id: i32,
        changes: &UpdatePrescriptionRequest,
    ) -> Result<Prescription, ConsultationError> {
        debug!("Updating prescription: {}", id);

        sqlx::query_as::<_, Prescription>(
            r#"
            UPDATE prescriptions
            SET consultation_id = COALESCE($2, consultation_id),
                kind            = COALESCE($3, kind),
                dosage          = COALESCE($4, dosage),
                prescribed_on   = COALESCE($5, prescribed_on)
            WHERE id = $1
            RETURNING id, consultation_id, kind, dosage, prescribed_on
            "#,
        )
        .bind(id)
        .bind(changes.consultation_id)
        .bind(changes.kind.as_deref())
        .bind(changes.dosage.as_deref())
        .bind(changes.prescribed_on)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| ConsultationError::NotFound(format!("Prescription {}", id)))
    }

    pub async fn delete_prescription(&self, id: i32) -> Result<u64, ConsultationError> {
        let deleted = sqlx::query("DELETE FROM prescriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(ConsultationError::NotFound(format!("Prescription {}", id)));
        }
        Ok(deleted)
    }
}
