// libs/auth-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::AccountService;

pub fn auth_routes(config: Arc<AppConfig>, pool: PgPool) -> Router {
    let administration = Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/pending", get(handlers::list_pending_users))
        .route("/users/{user_id}/approve", put(handlers::approve_user))
        .route("/users/{user_id}", delete(handlers::delete_user))
        .route("/admins", get(handlers::list_admins).post(handlers::create_admin))
        .route("/admins/{admin_id}", delete(handlers::delete_admin))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/admins/login", post(handlers::admin_login))
        .merge(administration)
        .with_state(AccountService::new(pool, config))
}
