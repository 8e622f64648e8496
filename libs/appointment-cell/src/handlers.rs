// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Principal;
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest, SendRemedyRequest};
use crate::router::AppointmentCellState;

fn map_appointment_error(error: AppointmentError) -> AppError {
    match error {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        AppointmentError::DoctorUnavailable => {
            AppError::NotFound("Doctor is not available at the moment".to_string())
        }
        AppointmentError::PatientBlocked => {
            AppError::Auth("Your account is blocked from booking".to_string())
        }
        AppointmentError::BookingLimitExceeded
        | AppointmentError::TooManyRecentCancellations => {
            AppError::RateLimited(error.to_string())
        }
        AppointmentError::SlotUnavailable => AppError::Conflict("Slot not available".to_string()),
        AppointmentError::InvalidState(status) => AppError::Conflict(format!(
            "Appointment cannot be modified in current status: {}",
            status
        )),
        AppointmentError::Unauthorized => {
            AppError::Auth("Not authorized to act on this appointment".to_string())
        }
        AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        AppointmentError::ExternalServiceError(msg) => AppError::ExternalService(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let is_self = principal.patient_id() == Some(request.patient_id);
    if !is_self && !principal.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to book appointment for this patient".to_string(),
        ));
    }

    let appointment = state
        .booking
        .book(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .get(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    let is_patient = principal.patient_id() == Some(appointment.patient_id);
    let is_doctor = principal.doctor_id() == Some(appointment.doctor_id);
    if !is_patient && !is_doctor && !principal.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let is_self = principal.patient_id() == Some(patient_id);
    if !is_self && !principal.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view these appointments".to_string(),
        ));
    }

    let appointments = state
        .booking
        .list_for_patient(patient_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "success": true, "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn list_doctor_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let is_self = principal.doctor_id() == Some(doctor_id);
    if !is_self && !principal.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view these appointments".to_string(),
        ));
    }

    let appointments = state
        .booking
        .list_for_doctor(doctor_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "success": true, "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn list_all_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Auth("Admin access required".to_string()));
    }

    let appointments = state
        .booking
        .list_all()
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "success": true, "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn accept_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .accept(appointment_id, &principal)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment accepted"
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .complete(appointment_id, &principal)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment completed"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .cancel(appointment_id, &principal)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn send_remedy(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<SendRemedyRequest>,
) -> Result<Json<Value>, AppError> {
    let image = BASE64
        .decode(request.image_base64.as_bytes())
        .map_err(|_| AppError::BadRequest("Invalid image encoding".to_string()))?;

    let appointment = state
        .lifecycle
        .send_remedy(appointment_id, &principal, image, &request.content_type)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "remedy_image_url": appointment.remedy_image_url,
        "message": "Remedy sent successfully"
    })))
}

#[axum::debug_handler]
pub async fn view_remedy(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let remedy_image_url = state
        .lifecycle
        .remedy_image(appointment_id, &principal)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "remedy_image_url": remedy_image_url
    })))
}
