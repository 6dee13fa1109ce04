use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    Consultation, ConsultationSearchQuery, ConsultationSummary, CreateConsultationRequest, UpdateConsultationRequest,
};
use crate::services::ConsultationService;

#[axum::debug_handler]
pub async fn list_consultations(
    State(service): State<ConsultationService>,
) -> Result<Json<Vec<Consultation>>, AppError> {
    Ok(Json(service.list_consultations().await?))
}

#[axum::debug_handler]
pub async fn search_consultations(
    State(service): State<ConsultationService>,
    Query(query): Query<ConsultationSearchQuery>,
) -> Result<Json<Vec<ConsultationSummary>>, AppError> {
    let filters = query.into_filters()?;
    Ok(Json(service.search_consultations(&filters).await?))
}

#[axum::debug_handler]
pub async fn create_consultation(
    State(service): State<ConsultationService>,
    payload: Result<Json<CreateConsultationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let consultation = request.validate(Utc::now().naive_utc())?;

    let id = service.create_consultation(&consultation).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[axum::debug_handler]
pub async fn get_consultation(
    State(service): State<ConsultationService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Consultation>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.get_consultation(id).await?))
}

#[axum::debug_handler]
pub async fn update_consultation(
    State(service): State<ConsultationService>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateConsultationRequest>, JsonRejection>,
) -> Result<Json<Consultation>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let changes = request.validate()?;

    Ok(Json(service.update_consultation(id, &changes).await?))
}

#[axum::debug_handler]
pub async fn delete_consultation(
    State(service): State<ConsultationService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = path?;
    let deleted = service.delete_consultation(id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
