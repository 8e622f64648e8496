// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_time: NaiveTime,
    /// Fee owed, copied from the doctor record at booking time.
    pub amount: i64,
    pub payment: bool,
    pub status: AppointmentStatus,
    pub cancelled_by: Option<CancelledBy>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub is_reviewed: bool,
    pub remedy_sent: bool,
    pub remedy_image_url: Option<String>,
    /// The person being examined, captured from the booking form. Distinct
    /// from the account that booked.
    pub patient: PatientIntake,
    pub booking_snapshot: BookingSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Display form of the slot date. Strings exist only at this boundary;
    /// everything else works on `NaiveDate`.
    pub fn slot_date_display(&self) -> String {
        self.slot_date.format("%d/%m/%Y").to_string()
    }

    pub fn slot_time_display(&self) -> String {
        self.slot_time.format("%I:%M %p").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// The full transition relation of the lifecycle state machine.
    pub fn valid_transitions(&self) -> Vec<AppointmentStatus> {
        match self {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Patient,
    Doctor,
}

impl fmt::Display for CancelledBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelledBy::Patient => write!(f, "patient"),
            CancelledBy::Doctor => write!(f, "doctor"),
        }
    }
}

/// Intake details collected once on the booking form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientIntake {
    pub name: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub reason: String,
    pub address: String,
}

/// Immutable copy of display data taken when the booking is made. Written
/// once and never patched, so the fee shown later is the fee that was
/// agreed, whatever the doctor charges today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSnapshot {
    pub doctor_name: String,
    pub doctor_specialty: String,
    pub doctor_fees: i64,
    pub patient_name: String,
    pub patient_email: String,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_time: NaiveTime,
    pub patient: PatientIntake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRemedyRequest {
    /// Base64-encoded image payload.
    pub image_base64: String,
    pub content_type: String,
}

// ==============================================================================
// BOOKING LIMITS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingLimits {
    /// Cap on a patient's simultaneously open (non-terminal) appointments.
    pub max_active_appointments: u64,
    /// Cap on patient-initiated cancellations inside the trailing window.
    pub max_recent_cancellations: u64,
    pub cancellation_window_hours: i64,
}

impl Default for BookingLimits {
    fn default() -> Self {
        Self {
            max_active_appointments: 5,
            max_recent_cancellations: 3,
            cancellation_window_hours: 24,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor is not available at the moment")]
    DoctorUnavailable,

    #[error("Patient account is blocked")]
    PatientBlocked,

    #[error("You have reached the maximum number of appointments allowed")]
    BookingLimitExceeded,

    #[error("You have cancelled too many appointments in the last 24 hours. Please try again later")]
    TooManyRecentCancellations,

    #[error("Slot not available")]
    SlotUnavailable,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidState(AppointmentStatus),

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}
