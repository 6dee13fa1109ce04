use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{CreatePatientRequest, Patient, PatientSearchQuery, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn list_patients(
    State(service): State<PatientService>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Vec<Patient>>, AppError> {
    let patients = service.list_patients(&query).await?;
    Ok(Json(patients))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(service): State<PatientService>,
    payload: Result<Json<CreatePatientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let patient = request.validate()?;

    let cin = service.create_patient(&patient).await?;

    Ok((StatusCode::CREATED, Json(json!({ "cin": cin }))))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(service): State<PatientService>,
    Path(cin): Path<String>,
) -> Result<Json<Patient>, AppError> {
    let patient = service.get_patient(&cin).await?;
    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(service): State<PatientService>,
    Path(cin): Path<String>,
    payload: Result<Json<UpdatePatientRequest>, JsonRejection>,
) -> Result<Json<Patient>, AppError> {
    let Json(request) = payload?;
    let changes = request.validate()?;

    let patient = service.update_patient(&cin, &changes).await?;
    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(service): State<PatientService>,
    Path(cin): Path<String>,
) -> Result<Json<Value>, AppError> {
    let deleted = service.delete_patient(&cin).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
