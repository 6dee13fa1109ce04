use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{CreatePrescriptionRequest, Prescription, UpdatePrescriptionRequest};
use crate::services::PrescriptionService;

#[axum::debug_handler]
pub async fn list_prescriptions(
    State(service): State<PrescriptionService>,
) -> Result<Json<Vec<Prescription>>, AppError> {
    Ok(Json(service.list_prescriptions().await?))
}

#[axum::debug_handler]
pub async fn create_prescription(
    State(service): State<PrescriptionService>,
    payload: Result<Json<CreatePrescriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let id = service.create_prescription(&request.validate()?).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(service): State<PrescriptionService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Prescription>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.get_prescription(id).await?))
}

#[axum::debug_handler]
pub async fn update_prescription(
    State(service): State<PrescriptionService>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdatePrescriptionRequest>, JsonRejection>,
) -> Result<Json<Prescription>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    Ok(Json(service.update_prescription(id, &request.validate()?).await?))
}

#[axum::debug_handler]
pub async fn delete_prescription(
    State(service): State<PrescriptionService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = path?;
    let deleted = service.delete_prescription(id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
