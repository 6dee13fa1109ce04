use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};
use sqlx::PgPool;

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::practitioner::PractitionerService;

pub fn practitioner_routes(config: Arc<AppConfig>, pool: PgPool) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_practitioners).post(handlers::create_practitioner),
        )
        .route(
            "/{cin}",
            get(handlers::get_practitioner)
                .put(handlers::update_practitioner)
                .delete(handlers::delete_practitioner),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(PractitionerService::new(pool))
}
