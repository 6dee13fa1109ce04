use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{CreatePractitionerRequest, Practitioner, PractitionerSearchQuery, UpdatePractitionerRequest};
use crate::services::practitioner::PractitionerService;

#[axum::debug_handler]
pub async fn list_practitioners(
    State(service): State<PractitionerService>,
    Query(query): Query<PractitionerSearchQuery>,
) -> Result<Json<Vec<Practitioner>>, AppError> {
    Ok(Json(service.list_practitioners(&query).await?))
}

#[axum::debug_handler]
pub async fn create_practitioner(
    State(service): State<PractitionerService>,
    payload: Result<Json<CreatePractitionerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let practitioner = request.validate()?;

    let cin = service.create_practitioner(&practitioner).await?;

    Ok((StatusCode::CREATED, Json(json!({ "cin": cin }))))
}

#[axum::debug_handler]
pub async fn get_practitioner(
    State(service): State<PractitionerService>,
    Path(cin): Path<String>,
) -> Result<Json<Practitioner>, AppError> {
    Ok(Json(service.get_practitioner(&cin).await?))
}

#[axum::debug_handler]
pub async fn update_practitioner(
    State(service): State<PractitionerService>,
    Path(cin): Path<String>,
    payload: Result<Json<UpdatePractitionerRequest>, JsonRejection>,
) -> Result<Json<Practitioner>, AppError> {
    let Json(request) = payload?;
    let changes = request.validate()?;

    Ok(Json(service.update_practitioner(&cin, &changes).await?))
}

#[axum::debug_handler]
pub async fn delete_practitioner(
    State(service): State<PractitionerService>,
    Path(cin): Path<String>,
) -> Result<Json<Value>, AppError> {
    let deleted = service.delete_practitioner(&cin).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
