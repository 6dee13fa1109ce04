// libs/appointment-cell/src/services/postgres.rs
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use shared_database::DatabaseError;

use crate::models::{Appointment, AppointmentChanges, AppointmentSearchQuery, NewAppointment};
use crate::services::store::{AppointmentStore, AppointmentTransaction};

const APPOINTMENT_COLUMNS: &str = "id, patient_cin, practitioner_cin, scheduled_at, status, parent_id";

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i32,
    patient_cin: String,
    practitioner_cin: String,
    scheduled_at: NaiveDateTime,
    status: String,
    parent_id: Option<i32>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DatabaseError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(DatabaseError::Other)?;
        Ok(Appointment {
            id: row.id,
            patient_cin: row.patient_cin,
            practitioner_cin: row.practitioner_cin,
            scheduled_at: row.scheduled_at,
            status,
            parent_id: row.parent_id,
        })
    }
}

#[derive(Clone)]
pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn begin(&self) -> Result<Box<dyn AppointmentTransaction>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAppointmentTransaction { tx }))
    }

    async fn get_appointment(&self, id: i32) -> Result<Option<Appointment>, DatabaseError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Appointment::try_from).transpose()
    }

    async fn list_appointments(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError> {
        debug!("Listing appointments with filters {:?}", query);

        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE ($1::TEXT IS NULL OR patient_cin = $1)
              AND ($2::TEXT IS NULL OR practitioner_cin = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY scheduled_at, id
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(query.patient.as_deref())
        .bind(query.practitioner.as_deref())
        .bind(query.status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Appointment::try_from).collect()
    }

    async fn delete_appointment(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PgAppointmentTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AppointmentTransaction for PgAppointmentTransaction {
    async fn insert_appointment(&mut self, appointment: &NewAppointment) -> Result<Appointment, DatabaseError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            INSERT INTO appointments (patient_cin, practitioner_cin, scheduled_at, status, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(&appointment.patient_cin)
        .bind(&appointment.practitioner_cin)
        .bind(appointment.scheduled_at)
        .bind(appointment.status.as_str())
        .bind(appointment.parent_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Appointment::try_from(row)
    }

    async fn update_appointment(
        &mut self,
        id: i32,
        changes: &AppointmentChanges,
    ) -> Result<Option<Appointment>, DatabaseError> {
        // Takes the row lock; concurrent updates of the same appointment queue here.
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            UPDATE appointments
            SET patient_cin      = COALESCE($2, patient_cin),
                practitioner_cin = COALESCE($3, practitioner_cin),
                scheduled_at     = COALESCE($4, scheduled_at),
                status           = COALESCE($5, status),
                parent_id        = COALESCE($6, parent_id)
            WHERE id = $1
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .bind(changes.patient_cin.as_deref())
        .bind(changes.practitioner_cin.as_deref())
        .bind(changes.scheduled_at)
        .bind(changes.status.map(|status| status.as_str()))
        .bind(changes.parent_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Appointment::try_from).transpose()
    }

    async fn find_consultation(&mut self, appointment_id: i32) -> Result<Option<i32>, DatabaseError> {
        let id = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM consultations WHERE appointment_id = $1 ORDER BY id LIMIT 1",
        )
        .bind(appointment_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn insert_consultation(
        &mut self,
        appointment_id: i32,
        consulted_at: NaiveDateTime,
        report: &str,
    ) -> Result<i32, DatabaseError> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO consultations (appointment_id, consulted_at, report)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(appointment_id)
        .bind(consulted_at)
        .bind(report)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
