use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events pushed into principal rooms. Two shapes: the rich
/// `new_appointment` toast for the doctor panel, and thin "go refetch"
/// signals that carry no payload beyond identifiers, so a missed event only
/// delays a client, never loses data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RealtimeEvent {
    NewAppointment {
        appointment_id: Uuid,
        doctor_id: Uuid,
        patient_name: String,
        slot_date: NaiveDate,
        slot_time: NaiveTime,
    },
    AppointmentStatusUpdate {
        appointment_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        status: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cancelled_by: Option<String>,
    },
    /// The recipient should re-fetch its notification list.
    NewNotification,
}
