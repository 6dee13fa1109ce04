// libs/consultation-cell/src/services/consultation.rs
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use shared_database::{contains_pattern, DatabaseError};

use crate::models::{
    Consultation, ConsultationError, ConsultationFilters, ConsultationSummary, NewConsultation,
    UpdateConsultationRequest,
};

const CONSULTATION_COLUMNS: &str = "id, appointment_id, consulted_at, report, price";

#[derive(Clone)]
pub struct ConsultationService {
    pool: PgPool,
}

impl ConsultationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_consultations(&self) -> Result<Vec<Consultation>, ConsultationError> {
        let consultations = sqlx::query_as::<_, Consultation>(&format!(
            "SELECT {} FROM consultations ORDER BY consulted_at DESC, id",
            CONSULTATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(consultations)
    }

    /// Name filters match first or last name, case-insensitively. The date
    /// filter matches the calendar day of the consultation.
    pub async fn search_consultations(
        &self,
        filters: &ConsultationFilters,
    ) -> Result<Vec<ConsultationSummary>, ConsultationError> {
        debug!("Searching consultations with filters: {:?}", filters);

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
              c.id,
              c.appointment_id,
              c.consulted_at,
              c.report,
              c.price,
              p.cin AS patient_cin,
              p.first_name || ' ' || p.last_name AS patient_name,
              pr.cin AS practitioner_cin,
              pr.first_name || ' ' || pr.last_name AS practitioner_name
            FROM consultations c
            LEFT JOIN appointments a ON a.id = c.appointment_id
            LEFT JOIN patients p ON p.cin = a.patient_cin
            LEFT JOIN practitioners pr ON pr.cin = a.practitioner_cin
            WHERE 1=1
            "#,
        );

        if let Some(patient) = &filters.patient {
            let like = contains_pattern(patient);
            qb.push(" AND (p.last_name ILIKE ");
            qb.push_bind(like.clone());
            qb.push(r" ESCAPE '\' OR p.first_name ILIKE ");
            qb.push_bind(like);
            qb.push(r" ESCAPE '\') ");
        }
        if let Some(practitioner) = &filters.practitioner {
            let like = contains_pattern(practitioner);
            qb.push(" AND (pr.last_name ILIKE ");
            qb.push_bind(like.clone());
            qb.push(r" ESCAPE '\' OR pr.first_name ILIKE ");
            qb.push_bind(like);
            qb.push(r" ESCAPE '\') ");
        }
        if let Some(date) = filters.date {
            qb.push(" AND c.consulted_at::DATE = ");
            qb.push_bind(date);
        }
        if let Some(report) = &filters.report {
            qb.push(" AND c.report ILIKE ");
            qb.push_bind(contains_pattern(report));
            qb.push(r" ESCAPE '\' ");
        }

        qb.push(" ORDER BY c.consulted_at DESC, c.id ");

        let rows = qb
            .build_query_as::<ConsultationSummary>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(rows)
    }

    pub async fn get_consultation(&self, id: i32) -> Result<Consultation, ConsultationError> {
        sqlx::query_as::<_, Consultation>(&format!(
            "SELECT {} FROM consultations WHERE id = $1",
            CONSULTATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| ConsultationError::NotFound(format!("Consultation {}", id)))
    }

    /// Fails with `AlreadyExists` when the appointment already has a consultation.
    pub async fn create_consultation(&self, consultation: &NewConsultation) -> Result<i32, ConsultationError> {
        debug!("Creating consultation for appointment {}", consultation.appointment_id);

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO consultations (appointment_id, consulted_at, report, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(consultation.appointment_id)
        .bind(consultation.consulted_at)
        .bind(&consultation.report)
        .bind(consultation.price)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        info!("Consultation {} created for appointment {}", id, consultation.appointment_id);
        Ok(id)
    }

    pub async fn update_consultation(
        &self,
        id: i32,
        changes: &UpdateConsultationRequest,
    ) -> Result<Consultation, ConsultationError> {
        debug!("Updating consultation: {}", id);

        let consultation = sqlx::query_as::<_, Consultation>(&format!(
            r#"
            UPDATE consultations
            SET appointment_id = COALESCE($2, appointment_id),
                consulted_at   = COALESCE($3, consulted_at),
                report         = COALESCE($4, report),
                price          = COALESCE($5, price)
            WHERE id = $1
            RETURNING {}
            "#,
            CONSULTATION_COLUMNS
        ))
        .bind(id)
        .bind(changes.appointment_id)
        .bind(changes.consulted_at)
        .bind(changes.report.as_deref())
        .bind(changes.price)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| ConsultationError::NotFound(format!("Consultation {}", id)))?;

        info!("Consultation {} updated", id);
        Ok(consultation)
    }

    /// Prescriptions and exams of the consultation go with it.
    pub async fn delete_consultation(&self, id: i32) -> Result<u64, ConsultationError> {
        let deleted = sqlx::query("DELETE FROM consultations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(ConsultationError::NotFound(format!("Consultation {}", id)));
        }

        info!("Consultation {} deleted", id);
        Ok(deleted)
    }
}
