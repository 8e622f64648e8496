// libs/notification-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentRequest,
    AppointmentAccepted,
    AppointmentCancelledByPatient,
    AppointmentCancelledByDoctor,
    AppointmentCompleted,
    RemedySent,
}

/// Listing row: the notification with the related appointment's slot
/// joined in for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationWithSlot {
    #[serde(flatten)]
    pub notification: Notification,
    pub slot_date: Option<NaiveDate>,
    pub slot_time: Option<NaiveTime>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
