// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{Appointment, AppointmentSearchQuery, BookAppointmentRequest, UpdateAppointmentRequest};
use crate::services::confirmation::AppointmentConfirmationService;

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(service): State<AppointmentConfirmationService>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = service.list_appointments(&query).await?;
    Ok(Json(appointments))
}

/// Booking with a confirmed status creates the consultation in the same transaction.
#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<AppointmentConfirmationService>,
    Extension(user): Extension<User>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    debug!("User {} booking appointment", user.id);

    let outcome = service.book_appointment(request.validate()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": outcome.appointment.id,
            "consultationId": outcome.consultation_id,
            "appointment": outcome.appointment,
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<AppointmentConfirmationService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Appointment>, AppError> {
    let Path(appointment_id) = path?;
    let appointment = service.get_appointment(appointment_id).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(service): State<AppointmentConfirmationService>,
    path: Result<Path<i32>, PathRejection>,
    Extension(user): Extension<User>,
    payload: Result<Json<UpdateAppointmentRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(appointment_id) = path?;
    let Json(request) = payload?;
    debug!("User {} updating appointment {}", user.id, appointment_id);

    let changes = request.validate(appointment_id)?;
    let outcome = service.update_appointment(appointment_id, changes).await?;

    Ok(Json(json!({
        "message": "Appointment updated",
        "consultationCreated": outcome.consultation_created(),
        "consultationId": outcome.consultation_id,
        "appointment": outcome.appointment,
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(service): State<AppointmentConfirmationService>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(appointment_id) = path?;
    service.delete_appointment(appointment_id).await?;
    Ok(Json(json!({ "deleted": appointment_id })))
}
