// libs/patient-cell/src/handlers.rs
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
    CreatePatientRequest, PatientError, SetBlockedRequest, UpdatePatientProfileRequest,
};
use crate::router::PatientCellState;

fn map_patient_error(error: PatientError) -> AppError {
    match error {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::ValidationError(msg) => AppError::BadRequest(msg),
        PatientError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<PatientCellState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Auth("Admin access required".to_string()));
    }

    let patient = state
        .patients
        .create(request)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient,
        "message": "Patient registered successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<PatientCellState>>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let is_self = principal.patient_id() == Some(patient_id);
    if !is_self && !principal.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this profile".to_string(),
        ));
    }

    let patient = state.patients.get(patient_id).await.map_err(map_patient_error)?;

    Ok(Json(json!({ "success": true, "patient": patient })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<PatientCellState>>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let is_self = principal.patient_id() == Some(patient_id);
    if !is_self && !principal.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to update this profile".to_string(),
        ));
    }

    let patient = state
        .patients
        .update_profile(patient_id, request)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient,
        "message": "Profile updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn set_blocked(
    State(state): State<Arc<PatientCellState>>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<SetBlockedRequest>,
) -> Result<Json<Value>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Auth("Admin access required".to_string()));
    }

    let patient = state
        .patients
        .set_blocked(patient_id, request.blocked)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "success": true,
        "is_blocked": patient.is_blocked,
        "message": if patient.is_blocked { "Patient blocked" } else { "Patient unblocked" }
    })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<PatientCellState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Auth("Admin access required".to_string()));
    }

    let patients = state
        .patients
        .list_with_stats()
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({ "success": true, "patients": patients })))
}
