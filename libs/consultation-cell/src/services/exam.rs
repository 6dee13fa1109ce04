use sqlx::PgPool;
use tracing::debug;

use shared_database::DatabaseError;

use crate::models::{ConsultationError, CreateExamRequest, Exam, UpdateExamRequest};

const EXAM_COLUMNS: &str = "id, consultation_id, kind, exam_date, result";

#[derive(Clone)]
pub struct ExamService {
    pool: PgPool,
}

impl ExamService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_exams(&self) -> Result<Vec<Exam>, ConsultationError> {
        let exams = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {} FROM exams ORDER BY exam_date DESC, id",
            EXAM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(exams)
    }

    pub async fn get_exam(&self, id: i32) -> Result<Exam, ConsultationError> {
        sqlx::query_as::<_, Exam>(&format!("SELECT {} FROM exams WHERE id = $1", EXAM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .ok_or_else(|| ConsultationError::NotFound(format!("Exam {}", id)))
    }

    pub async fn create_exam(&self, request: &CreateExamRequest) -> Result<i32, ConsultationError> {
        debug!("Adding exam to consultation {}", request.consultation_id);

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO exams (consultation_id, kind, exam_date, result)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(request.consultation_id)
        .bind(&request.kind)
        .bind(request.exam_date)
        .bind(request.result.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(id)
    }

    pub async fn update_exam(&self, id: i32, changes: &UpdateExamRequest) -> Result<Exam, ConsultationError> {
        debug!("Updating exam: {}", id);

        sqlx::query_as::<_, Exam>(&format!(
            r#"
            UPDATE exams
            SET consultation_id = COALESCE($2, consultation_id),
                kind            = COALESCE($3, kind),
                exam_date       = COALESCE($4, exam_date),
                result          = COALESCE($5, result)
            WHERE id = $1
            RETURNING {}
            "#,
            EXAM_COLUMNS
        ))
        .bind(id)
        .bind(changes.consultation_id)
        .bind(changes.kind.as_deref())
        .bind(changes.exam_date)
        .bind(changes.result.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| ConsultationError::NotFound(format!("Exam {}", id)))
    }

    pub async fn delete_exam(&self, id: i32) -> Result<u64, ConsultationError> {
        let deleted = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(ConsultationError::NotFound(format!("Exam {}", id)));
        }
        Ok(deleted)
    }
}
