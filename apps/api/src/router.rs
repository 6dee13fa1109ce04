use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;

use appointment_cell::{appointment_routes, PgAppointmentStore};
use auth_cell::auth_routes;
use consultation_cell::{consultation_routes, exam_routes, prescription_routes};
use patient_cell::patient_routes;
use practitioner_cell::practitioner_routes;
use shared_config::AppConfig;
use shared_models::error::AppError;

async fn health(State(pool): State<PgPool>) -> Result<Json<Value>, AppError> {
    shared_database::ping(&pool).await?;
    Ok(Json(json!({ "status": "ok", "database": "reachable" })))
}

pub fn create_router(config: Arc<AppConfig>, pool: PgPool) -> Router {
    let store = Arc::new(PgAppointmentStore::new(pool.clone()));

    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .route("/health", get(health))
        .with_state(pool.clone())
        .nest("/auth", auth_routes(config.clone(), pool.clone()))
        .nest("/patients", patient_routes(config.clone(), pool.clone()))
        .nest("/practitioners", practitioner_routes(config.clone(), pool.clone()))
        .nest("/appointments", appointment_routes(config.clone(), store))
        .nest("/consultations", consultation_routes(config.clone(), pool.clone()))
        .nest("/prescriptions", prescription_routes(config.clone(), pool.clone()))
        .nest("/exams", exam_routes(config, pool))
}
