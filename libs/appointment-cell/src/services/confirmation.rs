// libs/appointment-cell/src/services/confirmation.rs
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::models::{
    Appointment, AppointmentChanges, AppointmentError, AppointmentOutcome, AppointmentSearchQuery, NewAppointment,
};
use crate::services::store::{AppointmentStore, AppointmentTransaction};

/// Books and updates appointments. Whenever an appointment ends up confirmed,
/// the same transaction guarantees it owns exactly one consultation.
#[derive(Clone)]
pub struct AppointmentConfirmationService {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentConfirmationService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn book_appointment(&self, appointment: NewAppointment) -> Result<AppointmentOutcome, AppointmentError> {
        debug!(
            "Booking appointment for patient {} with practitioner {}",
            appointment.patient_cin, appointment.practitioner_cin
        );

        let mut tx = self.store.begin().await?;
        let result = Self::book_in(tx.as_mut(), &appointment).await;
        let outcome = Self::settle(tx, result).await?;

        info!(
            "Appointment {} booked with status {}",
            outcome.appointment.id, outcome.appointment.status
        );
        Ok(outcome)
    }

    pub async fn update_appointment(
        &self,
        appointment_id: i32,
        changes: AppointmentChanges,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let mut tx = self.store.begin().await?;
        let result = Self::update_in(tx.as_mut(), appointment_id, &changes).await;
        let outcome = Self::settle(tx, result).await?;

        info!("Appointment {} updated successfully", appointment_id);
        Ok(outcome)
    }

    pub async fn get_appointment(&self, appointment_id: i32) -> Result<Appointment, AppointmentError> {
        self.store
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))
    }

    pub async fn list_appointments(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Searching appointments with filters: {:?}", query);
        Ok(self.store.list_appointments(query).await?)
    }

    pub async fn delete_appointment(&self, appointment_id: i32) -> Result<(), AppointmentError> {
        if !self.store.delete_appointment(appointment_id).await? {
            return Err(AppointmentError::NotFound(appointment_id));
        }
        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    async fn book_in(
        tx: &mut dyn AppointmentTransaction,
        appointment: &NewAppointment,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        let appointment = tx.insert_appointment(appointment).await?;
        Self::ensure_consultation(tx, appointment).await
    }

    async fn update_in(
        tx: &mut dyn AppointmentTransaction,
        appointment_id: i32,
        changes: &AppointmentChanges,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        let appointment = tx
            .update_appointment(appointment_id, changes)
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))?;
        Self::ensure_consultation(tx, appointment).await
    }

    /// The consultation starts at the appointment time with an empty report.
    /// An existing consultation is left as it is.
    async fn ensure_consultation(
        tx: &mut dyn AppointmentTransaction,
        appointment: Appointment,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        if !appointment.status.requires_consultation() {
            return Ok(AppointmentOutcome {
                appointment,
                consultation_id: None,
            });
        }

        if let Some(existing) = tx.find_consultation(appointment.id).await? {
            debug!(
                "Appointment {} already has consultation {}",
                appointment.id, existing
            );
            return Ok(AppointmentOutcome {
                appointment,
                consultation_id: None,
            });
        }

        let consultation_id = tx
            .insert_consultation(appointment.id, appointment.scheduled_at, "")
            .await?;
        info!(
            "Consultation {} created for confirmed appointment {}",
            consultation_id, appointment.id
        );

        Ok(AppointmentOutcome {
            appointment,
            consultation_id: Some(consultation_id),
        })
    }

    /// Commit on success, roll back on any failure. A failed rollback is logged
    /// and the workflow error is still returned.
    async fn settle(
        tx: Box<dyn AppointmentTransaction>,
        result: Result<AppointmentOutcome, AppointmentError>,
    ) -> Result<AppointmentOutcome, AppointmentError> {
        match result {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(err) => {
                warn!("Rolling back appointment transaction: {}", err);
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}
