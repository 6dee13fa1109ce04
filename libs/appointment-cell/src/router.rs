// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::confirmation::AppointmentConfirmationService;
use crate::services::store::AppointmentStore;

pub fn appointment_routes(config: Arc<AppConfig>, store: Arc<dyn AppointmentStore>) -> Router {
    let service = AppointmentConfirmationService::new(store);

    // All appointment operations require authentication
    Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::book_appointment))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
