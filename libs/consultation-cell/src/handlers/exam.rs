use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{CreateExamRequest, Exam, UpdateExamRequest};
use crate::services::ExamService;

#[axum::debug_handler]
pub async fn list_exams(State(service): State<ExamService>) -> Result<Json<Vec<Exam>>, AppError> {
    Ok(Json(service.list_exams().await?))
}

#[axum::debug_handler]
pub async fn create_exam(
    State(service): State<ExamService>,
    payload: Result<Json<CreateExamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let id = service.create_exam(&request.validate()?).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[axum::debug_handler]
pub async fn get_exam(
    State(service): State<ExamService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Exam>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.get_exam(id).await?))
}

#[axum::debug_handler]
pub async fn update_exam(
    State(service): State<ExamService>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateExamRequest>, JsonRejection>,
) -> Result<Json<Exam>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    Ok(Json(service.update_exam(id, &request.validate()?).await?))
}

#[axum::debug_handler]
pub async fn delete_exam(
    State(service): State<ExamService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = path?;
    let deleted = service.delete_exam(id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
