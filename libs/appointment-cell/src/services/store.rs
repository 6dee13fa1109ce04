// libs/appointment-cell/src/services/store.rs
use async_trait::async_trait;
use chrono::NaiveDateTime;

use shared_database::DatabaseError;

use crate::models::{Appointment, AppointmentChanges, AppointmentSearchQuery, NewAppointment};

/// Persistence seam for appointments. Everything that writes goes through a
/// transaction obtained from [`AppointmentStore::begin`].
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn AppointmentTransaction>, DatabaseError>;

    async fn get_appointment(&self, id: i32) -> Result<Option<Appointment>, DatabaseError>;

    async fn list_appointments(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError>;

    /// Returns `false` when no row matched. Consultations go with it.
    async fn delete_appointment(&self, id: i32) -> Result<bool, DatabaseError>;
}

/// A unit of work. Dropping it without calling `commit` discards its effects,
/// but callers are expected to `rollback` explicitly.
#[async_trait]
pub trait AppointmentTransaction: Send {
    async fn insert_appointment(&mut self, appointment: &NewAppointment) -> Result<Appointment, DatabaseError>;

    /// `Ok(None)` when no row has this id.
    async fn update_appointment(
        &mut self,
        id: i32,
        changes: &AppointmentChanges,
    ) -> Result<Option<Appointment>, DatabaseError>;

    async fn find_consultation(&mut self, appointment_id: i32) -> Result<Option<i32>, DatabaseError>;

    async fn insert_consultation(
        &mut self,
        appointment_id: i32,
        consulted_at: NaiveDateTime,
        report: &str,
    ) -> Result<i32, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError>;
}
