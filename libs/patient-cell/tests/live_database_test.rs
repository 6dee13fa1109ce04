// Runs only when LIVE_DATABASE_TESTS=true, against TEST_DATABASE_URL.

use assert_matches::assert_matches;
use sqlx::PgPool;

use patient_cell::{Patient, PatientError, PatientSearchQuery, PatientService, Sex, UpdatePatientRequest};
use shared_utils::test_utils::TestConfig;

fn should_run_live_tests() -> bool {
    std::env::var("LIVE_DATABASE_TESTS").unwrap_or_default() == "true"
}

async fn live_pool() -> PgPool {
    let mut config = TestConfig::default().to_app_config();
    if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
        config.database_url = url;
    }
    let pool = shared_database::connect(&config).await.unwrap();
    shared_database::run_migrations(&pool).await.unwrap();
    pool
}

fn patient(cin: &str, last_name: &str) -> Patient {
    Patient {
        cin: cin.to_string(),
        first_name: "Amina".to_string(),
        last_name: last_name.to_string(),
        age: 34,
        address: Some("12 rue des Orangers".to_string()),
        email: None,
        sex: Some(Sex::Female),
        phone: None,
    }
}

async fn fresh(service: &PatientService, pool: &PgPool, patient: &Patient) {
    sqlx::query("DELETE FROM patients WHERE cin = $1")
        .bind(&patient.cin)
        .execute(pool)
        .await
        .unwrap();
    service.create_patient(patient).await.unwrap();
}

fn by_name(name: &str) -> PatientSearchQuery {
    PatientSearchQuery {
        name: Some(name.to_string()),
    }
}

#[tokio::test]
async fn test_live_name_search_is_case_insensitive_substring() {
    if !should_run_live_tests() {
        println!("Skipping live database test - set LIVE_DATABASE_TESTS=true to enable");
        return;
    }

    let pool = live_pool().await;
    let service = PatientService::new(pool.clone());
    fresh(&service, &pool, &patient("LP-search", "Bensouda")).await;

    let found = service.list_patients(&by_name("NSOU")).await.unwrap();
    assert!(found.iter().any(|p| p.cin == "LP-search"));

    // Wildcard characters in the term match literally.
    let literal = service.list_patients(&by_name("%")).await.unwrap();
    assert!(literal.iter().all(|p| p.last_name.contains('%')));
    let underscore = service.list_patients(&by_name("Ben_ouda")).await.unwrap();
    assert!(!underscore.iter().any(|p| p.cin == "LP-search"));
}

#[tokio::test]
async fn test_live_update_keeps_omitted_columns() {
    if !should_run_live_tests() {
        println!("Skipping live database test - set LIVE_DATABASE_TESTS=true to enable");
        return;
    }

    let pool = live_pool().await;
    let service = PatientService::new(pool.clone());
    fresh(&service, &pool, &patient("LP-update", "Lahlou")).await;

    let changes = UpdatePatientRequest {
        age: Some(35),
        ..UpdatePatientRequest::default()
    };
    let updated = service.update_patient("LP-update", &changes).await.unwrap();

    assert_eq!(updated.age, 35);
    assert_eq!(updated.last_name, "Lahlou");
    assert_eq!(updated.address.as_deref(), Some("12 rue des Orangers"));
    assert_eq!(updated.sex, Some(Sex::Female));
}

#[tokio::test]
async fn test_live_unknown_cin_is_not_found() {
    if !should_run_live_tests() {
        println!("Skipping live database test - set LIVE_DATABASE_TESTS=true to enable");
        return;
    }

    let service = PatientService::new(live_pool().await);
    let changes = UpdatePatientRequest {
        age: Some(40),
        ..UpdatePatientRequest::default()
    };

    assert_matches!(service.get_patient("LP-missing").await, Err(PatientError::NotFound(_)));
    assert_matches!(
        service.update_patient("LP-missing", &changes).await,
        Err(PatientError::NotFound(_))
    );
    assert_matches!(service.delete_patient("LP-missing").await, Err(PatientError::NotFound(_)));
}

#[tokio::test]
async fn test_live_duplicate_cin_conflicts() {
    if !should_run_live_tests() {
        println!("Skipping live database test - set LIVE_DATABASE_TESTS=true to enable");
        return;
    }

    let pool = live_pool().await;
    let service = PatientService::new(pool.clone());
    let amina = patient("LP-dup", "Tazi");
    fresh(&service, &pool, &amina).await;

    assert_matches!(service.create_patient(&amina).await, Err(PatientError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_live_delete_removes_appointments() {
    if !should_run_live_tests() {
        println!("Skipping live database test - set LIVE_DATABASE_TESTS=true to enable");
        return;
    }

    let pool = live_pool().await;
    let service = PatientService::new(pool.clone());
    fresh(&service, &pool, &patient("LP-cascade", "Idrissi")).await;

    sqlx::query("DELETE FROM practitioners WHERE cin = 'LD-cascade'").execute(&pool).await.unwrap();
    sqlx::query("INSERT INTO practitioners (cin, first_name, last_name) VALUES ('LD-cascade', 'Omar', 'Tazi')")
        .execute(&pool)
        .await
        .unwrap();
    let appointment_id: i32 = sqlx::query_scalar(
        "INSERT INTO appointments (patient_cin, practitioner_cin, scheduled_at) VALUES ('LP-cascade', 'LD-cascade', '2024-03-01 10:00') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(service.delete_patient("LP-cascade").await.unwrap(), 1);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE id = $1")
        .bind(appointment_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
