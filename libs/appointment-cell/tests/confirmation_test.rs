use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime};

use appointment_cell::{
    AppointmentChanges, AppointmentConfirmationService, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    InMemoryAppointmentStore, NewAppointment,
};

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn new_appointment(status: AppointmentStatus) -> NewAppointment {
    NewAppointment {
        patient_cin: "P1".to_string(),
        practitioner_cin: "D1".to_string(),
        scheduled_at: at(1, 10, 0),
        status,
        parent_id: None,
    }
}

async fn setup() -> (InMemoryAppointmentStore, AppointmentConfirmationService) {
    let store = InMemoryAppointmentStore::new();
    store.add_patient("P1").await;
    store.add_patient("P2").await;
    store.add_practitioner("D1").await;
    let service = AppointmentConfirmationService::new(Arc::new(store.clone()));
    (store, service)
}

#[tokio::test]
async fn test_confirming_pending_appointment_creates_consultation() {
    let (store, service) = setup().await;
    let seeded = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap();

    let changes = AppointmentChanges {
        status: Some(AppointmentStatus::Confirmed),
        scheduled_at: Some(at(1, 10, 0)),
        ..AppointmentChanges::default()
    };
    let outcome = service.update_appointment(seeded.id, changes).await.unwrap();

    assert!(outcome.consultation_created());
    assert_eq!(outcome.appointment.status, AppointmentStatus::Confirmed);

    let consultations = store.consultations_for(seeded.id).await;
    assert_eq!(consultations.len(), 1);
    assert_eq!(consultations[0].consulted_at, at(1, 10, 0));
    assert_eq!(consultations[0].report, "");
    assert_eq!(Some(consultations[0].id), outcome.consultation_id);
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn test_reconfirming_is_idempotent() {
    let (store, service) = setup().await;
    let seeded = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap();

    let first = service
        .update_appointment(seeded.id, AppointmentChanges::status(AppointmentStatus::Confirmed))
        .await
        .unwrap();
    let second = service
        .update_appointment(seeded.id, AppointmentChanges::status(AppointmentStatus::Confirmed))
        .await
        .unwrap();

    assert!(first.consultation_created());
    assert!(!second.consultation_created());
    assert_eq!(store.consultations_for(seeded.id).await.len(), 1);
}

#[tokio::test]
async fn test_rescheduling_confirmed_appointment_keeps_existing_consultation() {
    let (store, service) = setup().await;
    let seeded = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap();
    service
        .update_appointment(seeded.id, AppointmentChanges::status(AppointmentStatus::Confirmed))
        .await
        .unwrap();

    let changes = AppointmentChanges {
        scheduled_at: Some(at(2, 9, 30)),
        ..AppointmentChanges::default()
    };
    let outcome = service.update_appointment(seeded.id, changes).await.unwrap();

    assert!(!outcome.consultation_created());
    assert_eq!(outcome.appointment.scheduled_at, at(2, 9, 30));
    let consultations = store.consultations_for(seeded.id).await;
    assert_eq!(consultations.len(), 1);
    assert_eq!(consultations[0].consulted_at, at(1, 10, 0));
}

#[tokio::test]
async fn test_non_confirming_transitions_create_nothing() {
    let (store, service) = setup().await;
    let seeded = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap();

    let cancelled = service
        .update_appointment(seeded.id, AppointmentChanges::status(AppointmentStatus::Cancelled))
        .await
        .unwrap();
    let pending = service
        .update_appointment(seeded.id, AppointmentChanges::status(AppointmentStatus::Pending))
        .await
        .unwrap();

    assert!(!cancelled.consultation_created());
    assert!(!pending.consultation_created());
    assert_eq!(store.consultation_count().await, 0);
}

#[tokio::test]
async fn test_omitted_fields_keep_stored_values() {
    let (store, service) = setup().await;
    let seeded = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap();

    let changes = AppointmentChanges {
        patient_cin: Some("P2".to_string()),
        ..AppointmentChanges::default()
    };
    let outcome = service.update_appointment(seeded.id, changes).await.unwrap();

    assert_eq!(outcome.appointment.patient_cin, "P2");
    assert_eq!(outcome.appointment.practitioner_cin, "D1");
    assert_eq!(outcome.appointment.scheduled_at, at(1, 10, 0));
    assert_eq!(outcome.appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn test_unknown_appointment_is_not_found_and_rolled_back() {
    let (store, service) = setup().await;

    let result = service
        .update_appointment(42, AppointmentChanges::status(AppointmentStatus::Confirmed))
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound(42)));
    assert_eq!(store.consultation_count().await, 0);
    assert_eq!(store.commit_count(), 0);
    assert_eq!(store.rollback_count(), 1);
}

#[tokio::test]
async fn test_failed_consultation_insert_rolls_back_status_change() {
    let (store, service) = setup().await;
    let seeded = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap();
    store.fail_next_consultation_insert();

    let result = service
        .update_appointment(seeded.id, AppointmentChanges::status(AppointmentStatus::Confirmed))
        .await;

    assert_matches!(result, Err(AppointmentError::StoreFailure(_)));
    let stored = store.appointment(seeded.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Pending);
    assert_eq!(store.consultation_count().await, 0);
    assert_eq!(store.rollback_count(), 1);

    // The next attempt goes through.
    let retry = service
        .update_appointment(seeded.id, AppointmentChanges::status(AppointmentStatus::Confirmed))
        .await
        .unwrap();
    assert!(retry.consultation_created());
}

#[tokio::test]
async fn test_unknown_reference_is_rejected_without_changes() {
    let (store, service) = setup().await;
    let seeded = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap();

    let changes = AppointmentChanges {
        practitioner_cin: Some("D404".to_string()),
        status: Some(AppointmentStatus::Confirmed),
        ..AppointmentChanges::default()
    };
    let result = service.update_appointment(seeded.id, changes).await;

    assert_matches!(result, Err(AppointmentError::InvalidReference(msg)) if msg == "Unknown practitioner reference");
    assert_eq!(store.appointment(seeded.id).await.unwrap().practitioner_cin, "D1");
    assert_eq!(store.consultation_count().await, 0);
}

#[tokio::test]
async fn test_booking_confirmed_creates_consultation() {
    let (store, service) = setup().await;

    let outcome = service
        .book_appointment(new_appointment(AppointmentStatus::Confirmed))
        .await
        .unwrap();

    assert!(outcome.consultation_created());
    assert_eq!(store.consultations_for(outcome.appointment.id).await.len(), 1);
}

#[tokio::test]
async fn test_booking_pending_creates_no_consultation() {
    let (store, service) = setup().await;

    let outcome = service
        .book_appointment(new_appointment(AppointmentStatus::Pending))
        .await
        .unwrap();

    assert!(!outcome.consultation_created());
    assert_eq!(store.consultation_count().await, 0);
}

#[tokio::test]
async fn test_booking_with_unknown_patient_fails() {
    let (store, service) = setup().await;
    let mut appointment = new_appointment(AppointmentStatus::Confirmed);
    appointment.patient_cin = "P404".to_string();

    let result = service.book_appointment(appointment).await;

    assert_matches!(result, Err(AppointmentError::InvalidReference(msg)) if msg == "Unknown patient reference");
    assert!(service.list_appointments(&AppointmentSearchQuery::default()).await.unwrap().is_empty());
    assert_eq!(store.consultation_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_confirmations_create_one_consultation() {
    let (store, service) = setup().await;
    let id = store.seed_appointment(new_appointment(AppointmentStatus::Pending)).await.unwrap().id;

    let first = service.clone();
    let second = service.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            first
                .update_appointment(id, AppointmentChanges::status(AppointmentStatus::Confirmed))
                .await
        }),
        tokio::spawn(async move {
            second
                .update_appointment(id, AppointmentChanges::status(AppointmentStatus::Confirmed))
                .await
        }),
    );

    let created = [a.unwrap().unwrap(), b.unwrap().unwrap()]
        .iter()
        .filter(|outcome| outcome.consultation_created())
        .count();
    assert_eq!(created, 1);
    assert_eq!(store.consultations_for(id).await.len(), 1);
}

#[tokio::test]
async fn test_delete_cascades_consultation_and_detaches_children() {
    let (store, service) = setup().await;
    let parent = service
        .book_appointment(new_appointment(AppointmentStatus::Confirmed))
        .await
        .unwrap();
    let mut follow_up = new_appointment(AppointmentStatus::Pending);
    follow_up.parent_id = Some(parent.appointment.id);
    let child = service.book_appointment(follow_up).await.unwrap();

    service.delete_appointment(parent.appointment.id).await.unwrap();

    assert_eq!(store.consultation_count().await, 0);
    assert_eq!(store.appointment(child.appointment.id).await.unwrap().parent_id, None);
    assert_matches!(
        service.delete_appointment(parent.appointment.id).await,
        Err(AppointmentError::NotFound(_))
    );
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let (_store, service) = setup().await;
    service
        .book_appointment(new_appointment(AppointmentStatus::Pending))
        .await
        .unwrap();
    service
        .book_appointment(new_appointment(AppointmentStatus::Confirmed))
        .await
        .unwrap();

    let query = AppointmentSearchQuery {
        status: Some(AppointmentStatus::Confirmed),
        ..AppointmentSearchQuery::default()
    };
    let confirmed = service.list_appointments(&query).await.unwrap();

    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].status, AppointmentStatus::Confirmed);
}
