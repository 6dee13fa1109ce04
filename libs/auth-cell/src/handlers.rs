use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{AdminAccount, AdminLoginResponse, CredentialsRequest, UserAccount, UserLoginResponse};
use crate::services::AccountService;

// ==============================================================================
// PUBLIC
// ==============================================================================

#[axum::debug_handler]
pub async fn register(
    State(service): State<AccountService>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let request = request.validate_new_account()?;

    let account = service.register(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created, awaiting administrator approval",
            "user": account,
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(service): State<AccountService>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<UserLoginResponse>, AppError> {
    let Json(request) = payload?;
    let request = request.validate_login()?;

    let response = service.login(&request).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn admin_login(
    State(service): State<AccountService>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    let Json(request) = payload?;
    let request = request.validate_login()?;

    let response = service.admin_login(&request).await?;
    Ok(Json(response))
}

// ==============================================================================
// ADMINISTRATOR ONLY
// ==============================================================================

#[axum::debug_handler]
pub async fn list_users(
    State(service): State<AccountService>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<UserAccount>>, AppError> {
    require_admin(&user)?;

    let users = service.list_users().await?;
    Ok(Json(users))
}

#[axum::debug_handler]
pub async fn list_pending_users(
    State(service): State<AccountService>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<UserAccount>>, AppError> {
    require_admin(&user)?;

    let users = service.list_pending_users().await?;
    Ok(Json(users))
}

#[axum::debug_handler]
pub async fn approve_user(
    State(service): State<AccountService>,
    Extension(user): Extension<User>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<UserAccount>, AppError> {
    require_admin(&user)?;
    let Path(user_id) = path?;

    let account = service.approve_user(user_id).await?;
    Ok(Json(account))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(service): State<AccountService>,
    Extension(user): Extension<User>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let Path(user_id) = path?;

    service.delete_user(user_id).await?;
    Ok(Json(json!({ "deleted": user_id })))
}

#[axum::debug_handler]
pub async fn list_admins(
    State(service): State<AccountService>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<AdminAccount>>, AppError> {
    require_admin(&user)?;

    let admins = service.list_admins().await?;
    Ok(Json(admins))
}

#[axum::debug_handler]
pub async fn create_admin(
    State(service): State<AccountService>,
    Extension(user): Extension<User>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AdminAccount>), AppError> {
    require_admin(&user)?;

    let Json(request) = payload?;
    let request = request.validate_new_account()?;

    let admin = service.create_admin(&request).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

#[axum::debug_handler]
pub async fn delete_admin(
    State(service): State<AccountService>,
    Extension(user): Extension<User>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let Path(admin_id) = path?;

    service.delete_admin(admin_id).await?;
    Ok(Json(json!({ "deleted": admin_id })))
}
