// libs/appointment-cell/src/services/memory.rs
//
// In-process store with the same constraint behavior as the PostgreSQL schema.
// A transaction holds the store lock for its whole lifetime and works on a copy
// of the state, which replaces the shared state only on commit.
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use shared_database::DatabaseError;

use crate::models::{
    Appointment, AppointmentChanges, AppointmentSearchQuery, NewAppointment, CONSULTATION_APPOINTMENT_FK,
    CONSULTATION_APPOINTMENT_KEY, PARENT_FK, PATIENT_FK, PRACTITIONER_FK,
};
use crate::services::store::{AppointmentStore, AppointmentTransaction};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredConsultation {
    pub id: i32,
    pub appointment_id: i32,
    pub consulted_at: NaiveDateTime,
    pub report: String,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    patients: HashSet<String>,
    practitioners: HashSet<String>,
    appointments: BTreeMap<i32, Appointment>,
    consultations: BTreeMap<i32, StoredConsultation>,
    last_appointment_id: i32,
    last_consultation_id: i32,
}

impl MemoryState {
    fn check_references(
        &self,
        patient_cin: &str,
        practitioner_cin: &str,
        parent_id: Option<i32>,
    ) -> Result<(), DatabaseError> {
        if !self.patients.contains(patient_cin) {
            return Err(foreign_key(PATIENT_FK, "patient_cin", patient_cin));
        }
        if !self.practitioners.contains(practitioner_cin) {
            return Err(foreign_key(PRACTITIONER_FK, "practitioner_cin", practitioner_cin));
        }
        if let Some(parent_id) = parent_id {
            if !self.appointments.contains_key(&parent_id) {
                return Err(foreign_key(PARENT_FK, "parent_id", &parent_id.to_string()));
            }
        }
        Ok(())
    }

    fn insert_appointment(&mut self, appointment: &NewAppointment) -> Result<Appointment, DatabaseError> {
        self.check_references(&appointment.patient_cin, &appointment.practitioner_cin, appointment.parent_id)?;

        self.last_appointment_id += 1;
        let stored = Appointment {
            id: self.last_appointment_id,
            patient_cin: appointment.patient_cin.clone(),
            practitioner_cin: appointment.practitioner_cin.clone(),
            scheduled_at: appointment.scheduled_at,
            status: appointment.status,
            parent_id: appointment.parent_id,
        };
        self.appointments.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

fn foreign_key(constraint: &str, column: &str, value: &str) -> DatabaseError {
    DatabaseError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        message: format!("Key ({})=({}) is not present in referenced table", column, value),
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAppointmentStore {
    state: Arc<Mutex<MemoryState>>,
    fail_consultation_insert: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_patient(&self, cin: &str) {
        self.state.lock().await.patients.insert(cin.to_string());
    }

    pub async fn add_practitioner(&self, cin: &str) {
        self.state.lock().await.practitioners.insert(cin.to_string());
    }

    /// Insert a row directly, without any workflow side effect.
    pub async fn seed_appointment(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        self.state.lock().await.insert_appointment(&appointment)
    }

    pub async fn appointment(&self, id: i32) -> Option<Appointment> {
        self.state.lock().await.appointments.get(&id).cloned()
    }

    pub async fn consultations_for(&self, appointment_id: i32) -> Vec<StoredConsultation> {
        self.state
            .lock()
            .await
            .consultations
            .values()
            .filter(|consultation| consultation.appointment_id == appointment_id)
            .cloned()
            .collect()
    }

    pub async fn consultation_count(&self) -> usize {
        self.state.lock().await.consultations.len()
    }

    /// The next consultation insert fails with a store error.
    pub fn fail_next_consultation_insert(&self) {
        self.fail_consultation_insert.store(true, Ordering::SeqCst);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn begin(&self) -> Result<Box<dyn AppointmentTransaction>, DatabaseError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(InMemoryTransaction {
            guard,
            working,
            fail_consultation_insert: self.fail_consultation_insert.clone(),
            commits: self.commits.clone(),
            rollbacks: self.rollbacks.clone(),
        }))
    }

    async fn get_appointment(&self, id: i32) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self.appointment(id).await)
    }

    async fn list_appointments(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError> {
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|appointment| query.matches(appointment))
            .cloned()
            .collect();
        appointments.sort_by_key(|appointment| (appointment.scheduled_at, appointment.id));
        Ok(appointments)
    }

    async fn delete_appointment(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.state.lock().await;
        if state.appointments.remove(&id).is_none() {
            return Ok(false);
        }

        state.consultations.retain(|_, consultation| consultation.appointment_id != id);
        for appointment in state.appointments.values_mut() {
            if appointment.parent_id == Some(id) {
                appointment.parent_id = None;
            }
        }
        Ok(true)
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_consultation_insert: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

#[async_trait]
impl AppointmentTransaction for InMemoryTransaction {
    async fn insert_appointment(&mut self, appointment: &NewAppointment) -> Result<Appointment, DatabaseError> {
        self.working.insert_appointment(appointment)
    }

    async fn update_appointment(
        &mut self,
        id: i32,
        changes: &AppointmentChanges,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let Some(current) = self.working.appointments.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        changes.apply_to(&mut updated);
        self.working
            .check_references(&updated.patient_cin, &updated.practitioner_cin, updated.parent_id)?;

        self.working.appointments.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn find_consultation(&mut self, appointment_id: i32) -> Result<Option<i32>, DatabaseError> {
        Ok(self
            .working
            .consultations
            .values()
            .find(|consultation| consultation.appointment_id == appointment_id)
            .map(|consultation| consultation.id))
    }

    async fn insert_consultation(
        &mut self,
        appointment_id: i32,
        consulted_at: NaiveDateTime,
        report: &str,
    ) -> Result<i32, DatabaseError> {
        if self.fail_consultation_insert.swap(false, Ordering::SeqCst) {
            return Err(DatabaseError::Other("simulated consultation insert failure".to_string()));
        }
        if !self.working.appointments.contains_key(&appointment_id) {
            return Err(foreign_key(
                CONSULTATION_APPOINTMENT_FK,
                "appointment_id",
                &appointment_id.to_string(),
            ));
        }
        if self
            .working
            .consultations
            .values()
            .any(|consultation| consultation.appointment_id == appointment_id)
        {
            return Err(DatabaseError::UniqueViolation {
                constraint: Some(CONSULTATION_APPOINTMENT_KEY.to_string()),
                message: format!("Key (appointment_id)=({}) already exists", appointment_id),
            });
        }

        self.working.last_consultation_id += 1;
        let id = self.working.last_consultation_id;
        self.working.consultations.insert(
            id,
            StoredConsultation {
                id,
                appointment_id,
                consulted_at,
                report: report.to_string(),
            },
        );
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let InMemoryTransaction { mut guard, working, commits, .. } = *self;
        *guard = working;
        commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
