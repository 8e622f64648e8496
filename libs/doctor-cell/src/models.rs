// libs/doctor-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    /// Consultation fee in minor currency units.
    pub fees: i64,
    pub address: String,
    pub image_url: Option<String>,
    pub available: bool,
    pub slots_booked: SlotLedger,
    pub average_rating: f64,
    pub total_rating: i64,
    pub review_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    /// Projection exposed to patients browsing the directory: everything
    /// except the contact email.
    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            id: self.id,
            name: self.name.clone(),
            specialty: self.specialty.clone(),
            degree: self.degree.clone(),
            experience: self.experience.clone(),
            about: self.about.clone(),
            fees: self.fees,
            address: self.address.clone(),
            image_url: self.image_url.clone(),
            available: self.available,
            average_rating: self.average_rating,
            total_rating: self.total_rating,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: i64,
    pub address: String,
    pub image_url: Option<String>,
    pub available: bool,
    pub average_rating: f64,
    pub total_rating: i64,
}

/// Per-doctor booking ledger: calendar date to the times already reserved
/// that day, in booking order. The map itself does not deduplicate;
/// `book` is the only write path and refuses duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotLedger(BTreeMap<NaiveDate, Vec<NaiveTime>>);

impl SlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_booked(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.0
            .get(&date)
            .is_some_and(|times| times.contains(&time))
    }

    /// Reserve a slot. Returns false (ledger unchanged) when the slot is
    /// already taken.
    pub fn book(&mut self, date: NaiveDate, time: NaiveTime) -> bool {
        let times = self.0.entry(date).or_default();
        if times.contains(&time) {
            return false;
        }
        times.push(time);
        true
    }

    /// Release a slot. Returns false when the slot was not booked.
    pub fn release(&mut self, date: NaiveDate, time: NaiveTime) -> bool {
        match self.0.get_mut(&date) {
            Some(times) => {
                let before = times.len();
                times.retain(|t| *t != time);
                times.len() < before
            }
            None => false,
        }
    }

    pub fn booked_times(&self, date: NaiveDate) -> Vec<NaiveTime> {
        self.0.get(&date).cloned().unwrap_or_default()
    }

    pub fn total_booked(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: i64,
    pub address: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    pub fees: Option<i64>,
    pub address: Option<String>,
    pub about: Option<String>,
    pub available: Option<bool>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

// ==============================================================================
// DASHBOARD MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDashboard {
    pub earnings: i64,
    pub completed_appointments: u64,
    pub patients: u64,
    pub latest_appointments: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub doctors: u64,
    pub patients: u64,
    pub completed_appointments: u64,
    pub specialties: u64,
    pub latest_appointments: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRosterEntry {
    pub patient: Value,
    pub completed: u64,
    pub cancelled: u64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
