// libs/doctor-cell/src/services/directory.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_store::{collections, DocumentStore, Filter};

use crate::models::{
    AdminDashboard, CreateDoctorRequest, Doctor, DoctorDashboard, DoctorError,
    PatientRosterEntry, SlotLedger, UpdateDoctorProfileRequest,
};

/// Doctor directory: profile CRUD, availability, the persisted slot
/// ledger, and the admin/doctor dashboards derived from the appointment
/// collection.
#[derive(Clone)]
pub struct DoctorDirectoryService {
    store: Arc<dyn DocumentStore>,
}

impl DoctorDirectoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        if request.name.trim().is_empty() || request.email.trim().is_empty() {
            return Err(DoctorError::ValidationError(
                "Doctor name and email are required".to_string(),
            ));
        }
        if request.fees < 0 {
            return Err(DoctorError::ValidationError(
                "Consultation fee cannot be negative".to_string(),
            ));
        }

        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            specialty: request.specialty,
            degree: request.degree,
            experience: request.experience,
            about: request.about,
            fees: request.fees,
            address: request.address,
            image_url: request.image_url,
            available: true,
            slots_booked: SlotLedger::new(),
            average_rating: 0.0,
            total_rating: 0,
            review_ids: Vec::new(),
            created_at: Utc::now(),
        };

        let document = serde_json::to_value(&doctor)
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;
        self.store
            .insert(collections::DOCTORS, document)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        info!("Doctor {} added to the directory", doctor.id);
        Ok(doctor)
    }

    pub async fn get(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let document = self
            .store
            .get(collections::DOCTORS, doctor_id)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?
            .ok_or(DoctorError::NotFound)?;

        parse_doctor(document)
    }

    pub async fn list(&self) -> Result<Vec<Doctor>, DoctorError> {
        let documents = self
            .store
            .list(collections::DOCTORS, &Filter::new())
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        documents.into_iter().map(parse_doctor).collect()
    }

    pub async fn set_availability(
        &self,
        doctor_id: Uuid,
        available: bool,
    ) -> Result<Doctor, DoctorError> {
        let updated = self
            .store
            .update(
                collections::DOCTORS,
                doctor_id,
                json!({ "available": available }),
            )
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound { .. } => DoctorError::NotFound,
                other => DoctorError::DatabaseError(other.to_string()),
            })?;

        info!("Doctor {} availability set to {}", doctor_id, available);
        parse_doctor(updated)
    }

    pub async fn update_profile(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorProfileRequest,
    ) -> Result<Doctor, DoctorError> {
        if let Some(fees) = request.fees {
            if fees < 0 {
                return Err(DoctorError::ValidationError(
                    "Consultation fee cannot be negative".to_string(),
                ));
            }
        }

        let mut patch = serde_json::Map::new();
        if let Some(fees) = request.fees {
            patch.insert("fees".to_string(), json!(fees));
        }
        if let Some(address) = request.address {
            patch.insert("address".to_string(), json!(address));
        }
        if let Some(about) = request.about {
            patch.insert("about".to_string(), json!(about));
        }
        if let Some(available) = request.available {
            patch.insert("available".to_string(), json!(available));
        }
        if let Some(image_url) = request.image_url {
            patch.insert("image_url".to_string(), json!(image_url));
        }

        if patch.is_empty() {
            return self.get(doctor_id).await;
        }

        let updated = self
            .store
            .update(collections::DOCTORS, doctor_id, Value::Object(patch))
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound { .. } => DoctorError::NotFound,
                other => DoctorError::DatabaseError(other.to_string()),
            })?;

        parse_doctor(updated)
    }

    /// Persist a rewritten slot ledger. Callers are expected to hold the
    /// per-doctor booking lock while the ledger is being mutated.
    pub async fn save_ledger(
        &self,
        doctor_id: Uuid,
        ledger: &SlotLedger,
    ) -> Result<(), DoctorError> {
        let ledger_value = serde_json::to_value(ledger)
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        self.store
            .update(
                collections::DOCTORS,
                doctor_id,
                json!({ "slots_booked": ledger_value }),
            )
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound { .. } => DoctorError::NotFound,
                other => DoctorError::DatabaseError(other.to_string()),
            })?;

        debug!("Slot ledger persisted for doctor {}", doctor_id);
        Ok(())
    }

    /// Remove a doctor together with its appointments and reviews.
    pub async fn delete(&self, doctor_id: Uuid) -> Result<(), DoctorError> {
        let removed = self
            .store
            .delete(collections::DOCTORS, doctor_id)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if !removed {
            return Err(DoctorError::NotFound);
        }

        let appointment_filter = Filter::new().eq("doctor_id", doctor_id);
        let appointments = self
            .store
            .delete_many(collections::APPOINTMENTS, &appointment_filter)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let review_filter = Filter::new().eq("doctor_id", doctor_id);
        let reviews = self
            .store
            .delete_many(collections::REVIEWS, &review_filter)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        info!(
            "Doctor {} deleted along with {} appointments and {} reviews",
            doctor_id, appointments, reviews
        );
        Ok(())
    }

    /// Doctor-panel dashboard: earnings over completed-or-paid
    /// appointments, distinct patients, completed count and the five most
    /// recent bookings.
    pub async fn dashboard(&self, doctor_id: Uuid) -> Result<DoctorDashboard, DoctorError> {
        let filter = Filter::new().eq("doctor_id", doctor_id);
        let appointments = self
            .store
            .list(collections::APPOINTMENTS, &filter)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let mut earnings = 0_i64;
        let mut completed = 0_u64;
        let mut patients: HashSet<String> = HashSet::new();

        for appointment in &appointments {
            let status = appointment.get("status").and_then(Value::as_str);
            let paid = appointment
                .get("payment")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            if status == Some("completed") {
                completed += 1;
            }
            if status == Some("completed") || paid {
                earnings += appointment.get("amount").and_then(Value::as_i64).unwrap_or(0);
            }
            if let Some(patient_id) = appointment.get("patient_id").and_then(Value::as_str) {
                patients.insert(patient_id.to_string());
            }
        }

        let mut latest = appointments;
        latest.reverse();
        latest.truncate(5);

        Ok(DoctorDashboard {
            earnings,
            completed_appointments: completed,
            patients: patients.len() as u64,
            latest_appointments: latest,
        })
    }

    /// Per-patient completed/cancelled counts across one doctor's
    /// appointments, joined with the patient records.
    pub async fn patient_roster(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<PatientRosterEntry>, DoctorError> {
        let filter = Filter::new().eq("doctor_id", doctor_id);
        let appointments = self
            .store
            .list(collections::APPOINTMENTS, &filter)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        // First-seen order so the roster mirrors the appointment history.
        let mut stats: Vec<(Uuid, u64, u64)> = Vec::new();
        for appointment in &appointments {
            let Some(patient_id) = appointment
                .get("patient_id")
                .and_then(Value::as_str)
                .and_then(|raw| Uuid::parse_str(raw).ok())
            else {
                warn!("Appointment without a parsable patient_id; skipping");
                continue;
            };

            let index = match stats.iter().position(|(id, _, _)| *id == patient_id) {
                Some(index) => index,
                None => {
                    stats.push((patient_id, 0, 0));
                    stats.len() - 1
                }
            };
            match appointment.get("status").and_then(Value::as_str) {
                Some("completed") => stats[index].1 += 1,
                Some("cancelled") => stats[index].2 += 1,
                _ => {}
            }
        }

        let mut roster = Vec::with_capacity(stats.len());
        for (patient_id, completed, cancelled) in stats {
            let Some(patient) = self
                .store
                .get(collections::PATIENTS, patient_id)
                .await
                .map_err(|e| DoctorError::DatabaseError(e.to_string()))?
            else {
                continue;
            };
            roster.push(PatientRosterEntry {
                patient,
                completed,
                cancelled,
            });
        }

        Ok(roster)
    }

    /// Admin-panel dashboard counts.
    pub async fn admin_dashboard(&self) -> Result<AdminDashboard, DoctorError> {
        let doctors = self
            .store
            .list(collections::DOCTORS, &Filter::new())
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let patients = self
            .store
            .count(collections::PATIENTS, &Filter::new())
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let completed_appointments = self
            .store
            .count(
                collections::APPOINTMENTS,
                &Filter::new().eq("status", "completed"),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let mut latest = self
            .store
            .list(collections::APPOINTMENTS, &Filter::new())
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;
        latest.reverse();
        latest.truncate(5);

        let specialties: HashSet<&str> = doctors
            .iter()
            .filter_map(|doctor| doctor.get("specialty").and_then(Value::as_str))
            .collect();

        Ok(AdminDashboard {
            doctors: doctors.len() as u64,
            patients,
            completed_appointments,
            specialties: specialties.len() as u64,
            latest_appointments: latest,
        })
    }
}

fn parse_doctor(document: Value) -> Result<Doctor, DoctorError> {
    serde_json::from_value(document)
        .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctor: {}", e)))
}
