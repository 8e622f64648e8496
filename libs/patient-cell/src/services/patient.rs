// libs/patient-cell/src/services/patient.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_store::{collections, DocumentStore, Filter};

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientWithStats, UpdatePatientProfileRequest,
};

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn DocumentStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the patient record backing an identity-provider account.
    pub async fn create(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        if request.name.trim().is_empty() || request.email.trim().is_empty() {
            return Err(PatientError::ValidationError(
                "Patient name and email are required".to_string(),
            ));
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            phone: None,
            address: None,
            dob: None,
            gender: None,
            image_url: None,
            is_blocked: false,
            created_at: Utc::now(),
        };

        let document = serde_json::to_value(&patient)
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;
        self.store
            .insert(collections::PATIENTS, document)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        info!("Patient {} registered", patient.id);
        Ok(patient)
    }

    pub async fn get(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        let document = self
            .store
            .get(collections::PATIENTS, patient_id)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?
            .ok_or(PatientError::NotFound)?;

        parse_patient(document)
    }

    pub async fn update_profile(
        &self,
        patient_id: Uuid,
        request: UpdatePatientProfileRequest,
    ) -> Result<Patient, PatientError> {
        if request.name.len() < 3 || request.name.len() > 15 {
            return Err(PatientError::ValidationError(
                "Name must be between 3 and 15 characters long".to_string(),
            ));
        }
        if request.phone.len() != 10 || !request.phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(PatientError::ValidationError(
                "Phone number must be exactly 10 digits".to_string(),
            ));
        }
        if request.address.len() > 80 {
            return Err(PatientError::ValidationError(
                "Address must be 80 characters or less".to_string(),
            ));
        }

        let mut patch = json!({
            "name": request.name,
            "phone": request.phone,
            "address": request.address,
            "dob": request.dob,
            "gender": request.gender,
        });
        if let (Some(fields), Some(image_url)) = (patch.as_object_mut(), request.image_url) {
            fields.insert("image_url".to_string(), json!(image_url));
        }

        let updated = self
            .store
            .update(collections::PATIENTS, patient_id, patch)
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound { .. } => PatientError::NotFound,
                other => PatientError::DatabaseError(other.to_string()),
            })?;

        parse_patient(updated)
    }

    /// Admin block/unblock. Blocked patients cannot book appointments.
    pub async fn set_blocked(
        &self,
        patient_id: Uuid,
        blocked: bool,
    ) -> Result<Patient, PatientError> {
        let updated = self
            .store
            .update(
                collections::PATIENTS,
                patient_id,
                json!({ "is_blocked": blocked }),
            )
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound { .. } => PatientError::NotFound,
                other => PatientError::DatabaseError(other.to_string()),
            })?;

        info!("Patient {} blocked flag set to {}", patient_id, blocked);
        parse_patient(updated)
    }

    /// Admin listing with each patient's count of not-cancelled
    /// appointments.
    pub async fn list_with_stats(&self) -> Result<Vec<PatientWithStats>, PatientError> {
        let documents = self
            .store
            .list(collections::PATIENTS, &Filter::new())
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let mut listing = Vec::with_capacity(documents.len());
        for document in documents {
            let patient = parse_patient(document)?;
            let active = self
                .store
                .count(
                    collections::APPOINTMENTS,
                    &Filter::new()
                        .eq("patient_id", patient.id)
                        .ne("status", "cancelled"),
                )
                .await
                .map_err(|e| PatientError::DatabaseError(e.to_string()))?;
            listing.push(PatientWithStats {
                patient,
                active_appointments: active,
            });
        }

        Ok(listing)
    }
}

fn parse_patient(document: Value) -> Result<Patient, PatientError> {
    serde_json::from_value(document)
        .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))
}
