// libs/consultation-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use sqlx::PgPool;

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{consultation, exam, prescription};
use crate::services::{ConsultationService, ExamService, PrescriptionService};

pub fn consultation_routes(config: Arc<AppConfig>, pool: PgPool) -> Router {
    Router::new()
        .route(
            "/",
            get(consultation::list_consultations).post(consultation::create_consultation),
        )
        .route("/search", get(consultation::search_consultations))
        .route(
            "/{consultation_id}",
            get(consultation::get_consultation)
                .put(consultation::update_consultation)
                .delete(consultation::delete_consultation),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(ConsultationService::new(pool))
}

pub fn prescription_routes(config: Arc<AppConfig>, pool: PgPool) -> Router {
    Router::new()
        .route(
            "/",
            get(prescription::list_prescriptions).post(prescription::create_prescription),
        )
        .route(
            "/{prescription_id}",
            get(prescription::get_prescription)
                .put(prescription::update_prescription)
                .delete(prescription::delete_prescription),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(PrescriptionService::new(pool))
}

pub fn exam_routes(config: Arc<AppConfig>, pool: PgPool) -> Router {
    Router::new()
        .route("/", get(exam::list_exams).post(exam::create_exam))
        .route(
            "/{exam_id}",
            get(exam::get_exam).put(exam::update_exam).delete(exam::delete_exam),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(ExamService::new(pool))
}
