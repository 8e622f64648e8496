// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Principal;
use shared_models::error::AppError;

use crate::models::{
    CreateDoctorRequest, DoctorError, SetAvailabilityRequest, UpdateDoctorProfileRequest,
};
use crate::router::DoctorCellState;

fn map_doctor_error(error: DoctorError) -> AppError {
    match error {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::ValidationError(msg) => AppError::BadRequest(msg),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn authorize_doctor_or_admin(principal: &Principal, doctor_id: Uuid) -> Result<(), AppError> {
    let is_self = principal.doctor_id() == Some(doctor_id);
    if !is_self && !principal.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to act on this doctor".to_string(),
        ));
    }
    Ok(())
}

/// Public directory listing; credentials and contact details stay private.
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<DoctorCellState>>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.directory.list().await.map_err(map_doctor_error)?;
    let summaries: Vec<_> = doctors.iter().map(|doctor| doctor.summary()).collect();

    Ok(Json(json!({ "success": true, "doctors": summaries })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<DoctorCellState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = state
        .directory
        .get(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "success": true, "doctor": doctor.summary() })))
}

#[axum::debug_handler]
pub async fn add_doctor(
    State(state): State<Arc<DoctorCellState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Auth("Only admins can add doctors".to_string()));
    }

    let doctor = state
        .directory
        .create(request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor added successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<DoctorCellState>>,
    Extension(principal): Extension<Principal>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Auth("Only admins can delete doctors".to_string()));
    }

    state
        .directory
        .delete(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor and related appointments deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<DoctorCellState>>,
    Extension(principal): Extension<Principal>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_doctor_or_admin(&principal, doctor_id)?;

    let doctor = state
        .directory
        .set_availability(doctor_id, request.available)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "available": doctor.available,
        "message": "Availability changed"
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<DoctorCellState>>,
    Extension(principal): Extension<Principal>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_doctor_or_admin(&principal, doctor_id)?;

    let doctor = state
        .directory
        .update_profile(doctor_id, request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Profile updated"
    })))
}

#[axum::debug_handler]
pub async fn doctor_dashboard(
    State(state): State<Arc<DoctorCellState>>,
    Extension(principal): Extension<Principal>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    authorize_doctor_or_admin(&principal, doctor_id)?;

    let dashboard = state
        .directory
        .dashboard(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "success": true, "dashboard": dashboard })))
}

#[axum::debug_handler]
pub async fn patient_roster(
    State(state): State<Arc<DoctorCellState>>,
    Extension(principal): Extension<Principal>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    authorize_doctor_or_admin(&principal, doctor_id)?;

    let roster = state
        .directory
        .patient_roster(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "success": true, "patients": roster })))
}

#[axum::debug_handler]
pub async fn admin_dashboard(
    State(state): State<Arc<DoctorCellState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Auth("Admin access required".to_string()));
    }

    let dashboard = state
        .directory
        .admin_dashboard()
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "success": true, "dashboard": dashboard })))
}
