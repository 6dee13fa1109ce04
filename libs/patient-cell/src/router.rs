use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use sqlx::PgPool;

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;
use crate::services::PatientService;

pub fn patient_routes(config: Arc<AppConfig>, pool: PgPool) -> Router {
    Router::new()
        .route("/", get(list_patients).post(create_patient))
        .route("/{cin}", get(get_patient).put(update_patient).delete(delete_patient))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(PatientService::new(pool))
}
