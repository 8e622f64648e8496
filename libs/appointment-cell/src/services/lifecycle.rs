// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::{Timelike, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::services::directory::DoctorDirectoryService;
use notification_cell::{NotificationKind, NotificationService};
use realtime_cell::{RealtimeEvent, RealtimeGateway};
use shared_clients::{ImageStore, Mailer};
use shared_models::auth::Principal;
use shared_store::{collections, DocumentStore};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, CancelledBy};
use crate::services::booking::{map_doctor_error, parse_appointment};
use crate::services::locks::DoctorSlotLocks;

/// Role-gated transitions over the appointment state machine. Stored
/// notifications are awaited (their failure fails the operation); realtime
/// pings and emails are best-effort and never revert a committed change.
pub struct LifecycleService {
    store: Arc<dyn DocumentStore>,
    doctors: DoctorDirectoryService,
    notifications: NotificationService,
    gateway: RealtimeGateway,
    mailer: Arc<dyn Mailer>,
    images: Arc<dyn ImageStore>,
    locks: DoctorSlotLocks,
}

enum CancelActor {
    Patient,
    Doctor,
    Admin,
}

impl LifecycleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        doctors: DoctorDirectoryService,
        notifications: NotificationService,
        gateway: RealtimeGateway,
        mailer: Arc<dyn Mailer>,
        images: Arc<dyn ImageStore>,
        locks: DoctorSlotLocks,
    ) -> Self {
        Self {
            store,
            doctors,
            notifications,
            gateway,
            mailer,
            images,
            locks,
        }
    }

    /// Doctor accepts a pending appointment.
    pub async fn accept(
        &self,
        appointment_id: Uuid,
        principal: &Principal,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        self.authorize_doctor(&appointment, principal)?;
        self.validate_transition(&appointment, AppointmentStatus::Confirmed)?;

        let updated = self
            .update_appointment(
                appointment_id,
                json!({ "status": AppointmentStatus::Confirmed.to_string() }),
            )
            .await?;

        self.notifications
            .create(
                updated.doctor_id,
                updated.patient_id,
                Some(updated.id),
                NotificationKind::AppointmentAccepted,
                "Appointment has been accepted.".to_string(),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        self.dispatch_status_side_effects(
            &updated,
            updated.patient_id,
            "confirmed",
            "Appointment has been accepted.",
            None,
            Some((
                "Appointment confirmed",
                format!(
                    "Doctor: {}\nTime: {}\nDate: {}\nStatus: Approved - The doctor approved your booking. Please check for more information.",
                    updated.booking_snapshot.doctor_name,
                    updated.slot_time_display(),
                    updated.slot_date_display()
                ),
            )),
        );

        info!("Appointment {} accepted", appointment_id);
        Ok(updated)
    }

    /// Doctor marks a confirmed appointment as completed.
    pub async fn complete(
        &self,
        appointment_id: Uuid,
        principal: &Principal,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        self.authorize_doctor(&appointment, principal)?;
        self.validate_transition(&appointment, AppointmentStatus::Completed)?;

        let updated = self
            .update_appointment(
                appointment_id,
                json!({ "status": AppointmentStatus::Completed.to_string() }),
            )
            .await?;

        self.notifications
            .create(
                updated.doctor_id,
                updated.patient_id,
                Some(updated.id),
                NotificationKind::AppointmentCompleted,
                "Appointment has been completed. You may now leave feedback.".to_string(),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        self.dispatch_status_side_effects(
            &updated,
            updated.patient_id,
            "completed",
            "Appointment has been completed.",
            None,
            None,
        );

        info!("Appointment {} completed", appointment_id);
        Ok(updated)
    }

    /// Cancel from `Pending` or `Confirmed`. Patients and doctors may
    /// cancel their own appointments; admin may cancel any. The slot goes
    /// back to the ledger under the same lock bookings take, and a second
    /// cancellation fails on the terminal-state check with the ledger
    /// untouched.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        principal: &Principal,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        let actor = self.cancel_actor(&appointment, principal)?;

        let _guard = self.locks.acquire(appointment.doctor_id).await;

        // Re-read under the lock: a concurrent cancel may have won.
        let appointment = self.get(appointment_id).await?;
        self.validate_transition(&appointment, AppointmentStatus::Cancelled)?;

        let cancelled_by = match actor {
            CancelActor::Patient => Some(CancelledBy::Patient),
            CancelActor::Doctor => Some(CancelledBy::Doctor),
            CancelActor::Admin => None,
        };
        let now = Utc::now().with_nanosecond(0).unwrap_or_else(Utc::now);

        let updated = self
            .update_appointment(
                appointment_id,
                json!({
                    "status": AppointmentStatus::Cancelled.to_string(),
                    "cancelled_by": cancelled_by,
                    "cancelled_at": now,
                }),
            )
            .await?;

        let mut doctor = self
            .doctors
            .get(updated.doctor_id)
            .await
            .map_err(map_doctor_error)?;
        if doctor
            .slots_booked
            .release(updated.slot_date, updated.slot_time)
        {
            self.doctors
                .save_ledger(updated.doctor_id, &doctor.slots_booked)
                .await
                .map_err(map_doctor_error)?;
        } else {
            warn!(
                "Slot {} {} was not in doctor {}'s ledger on cancellation",
                updated.slot_date, updated.slot_time, updated.doctor_id
            );
        }

        drop(_guard);

        let cancelled_by_label = cancelled_by.map(|by| by.to_string());
        match actor {
            CancelActor::Patient => {
                self.notifications
                    .create(
                        updated.patient_id,
                        updated.doctor_id,
                        Some(updated.id),
                        NotificationKind::AppointmentCancelledByPatient,
                        "Appointment has been cancelled.".to_string(),
                    )
                    .await
                    .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
                self.dispatch_status_side_effects(
                    &updated,
                    updated.doctor_id,
                    "cancelled",
                    "Appointment has been cancelled.",
                    cancelled_by_label,
                    None,
                );
            }
            CancelActor::Doctor => {
                self.notifications
                    .create(
                        updated.doctor_id,
                        updated.patient_id,
                        Some(updated.id),
                        NotificationKind::AppointmentCancelledByDoctor,
                        "Appointment has been cancelled.".to_string(),
                    )
                    .await
                    .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
                self.dispatch_status_side_effects(
                    &updated,
                    updated.patient_id,
                    "cancelled",
                    "Appointment has been cancelled.",
                    cancelled_by_label,
                    None,
                );
            }
            CancelActor::Admin => {
                // Admin force-cancel pings both parties; there is no
                // counterpart notification record.
                self.dispatch_status_side_effects(
                    &updated,
                    updated.patient_id,
                    "cancelled",
                    "Appointment has been cancelled.",
                    None,
                    None,
                );
                self.dispatch_status_side_effects(
                    &updated,
                    updated.doctor_id,
                    "cancelled",
                    "Appointment has been cancelled.",
                    None,
                    None,
                );
            }
        }

        info!("Appointment {} cancelled", appointment_id);
        Ok(updated)
    }

    /// Attach a remedy image to a completed appointment and notify the
    /// patient. The upload must succeed before any state changes.
    pub async fn send_remedy(
        &self,
        appointment_id: Uuid,
        principal: &Principal,
        image: Vec<u8>,
        content_type: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        self.authorize_doctor(&appointment, principal)?;
        if appointment.status != AppointmentStatus::Completed {
            return Err(AppointmentError::InvalidState(appointment.status));
        }
        if image.is_empty() {
            return Err(AppointmentError::ValidationError(
                "Please upload a remedy image".to_string(),
            ));
        }

        let image_url = self
            .images
            .upload(image, content_type)
            .await
            .map_err(|e| AppointmentError::ExternalServiceError(e.to_string()))?;

        let updated = self
            .update_appointment(
                appointment_id,
                json!({
                    "remedy_sent": true,
                    "remedy_image_url": image_url,
                }),
            )
            .await?;

        self.notifications
            .create(
                updated.doctor_id,
                updated.patient_id,
                Some(updated.id),
                NotificationKind::RemedySent,
                "Your doctor has sent you a remedy.".to_string(),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let remedy_url = updated.remedy_image_url.clone().unwrap_or_default();
        self.dispatch_status_side_effects(
            &updated,
            updated.patient_id,
            "completed",
            "Your doctor has sent you a remedy.",
            None,
            Some((
                "Remedy from your doctor",
                format!(
                    "Your doctor has sent you a remedy. You can view it here: {}",
                    remedy_url
                ),
            )),
        );

        info!("Remedy sent for appointment {}", appointment_id);
        Ok(updated)
    }

    /// Fetch the remedy image URL for one of the appointment's parties.
    pub async fn remedy_image(
        &self,
        appointment_id: Uuid,
        principal: &Principal,
    ) -> Result<Option<String>, AppointmentError> {
        let appointment = self.get(appointment_id).await?;

        let is_patient = principal.patient_id() == Some(appointment.patient_id);
        let is_doctor = principal.doctor_id() == Some(appointment.doctor_id);
        if !is_patient && !is_doctor && !principal.is_admin() {
            return Err(AppointmentError::Unauthorized);
        }

        Ok(appointment.remedy_image_url)
    }

    async fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let document = self
            .store
            .get(collections::APPOINTMENTS, appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)?;
        parse_appointment(document)
    }

    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        patch: serde_json::Value,
    ) -> Result<Appointment, AppointmentError> {
        let updated = self
            .store
            .update(collections::APPOINTMENTS, appointment_id, patch)
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound { .. } => AppointmentError::NotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;
        parse_appointment(updated)
    }

    fn authorize_doctor(
        &self,
        appointment: &Appointment,
        principal: &Principal,
    ) -> Result<(), AppointmentError> {
        if principal.doctor_id() != Some(appointment.doctor_id) {
            warn!(
                "Principal {} denied doctor operation on appointment {}",
                principal.id, appointment.id
            );
            return Err(AppointmentError::Unauthorized);
        }
        Ok(())
    }

    fn cancel_actor(
        &self,
        appointment: &Appointment,
        principal: &Principal,
    ) -> Result<CancelActor, AppointmentError> {
        if principal.is_admin() {
            return Ok(CancelActor::Admin);
        }
        if principal.doctor_id() == Some(appointment.doctor_id) {
            return Ok(CancelActor::Doctor);
        }
        if principal.patient_id() == Some(appointment.patient_id) {
            return Ok(CancelActor::Patient);
        }
        warn!(
            "Principal {} denied cancellation of appointment {}",
            principal.id, appointment.id
        );
        Err(AppointmentError::Unauthorized)
    }

    fn validate_transition(
        &self,
        appointment: &Appointment,
        next: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        if !appointment.status.can_transition_to(next) {
            warn!(
                "Invalid transition {} -> {} on appointment {}",
                appointment.status, next, appointment.id
            );
            return Err(AppointmentError::InvalidState(appointment.status));
        }
        Ok(())
    }

    /// Counterpart room ping, refetch signal and optional email, detached
    /// from the request.
    fn dispatch_status_side_effects(
        &self,
        appointment: &Appointment,
        room: Uuid,
        status: &str,
        message: &str,
        cancelled_by: Option<String>,
        email: Option<(&str, String)>,
    ) {
        let gateway = self.gateway.clone();
        let mailer = Arc::clone(&self.mailer);
        let event = RealtimeEvent::AppointmentStatusUpdate {
            appointment_id: appointment.id,
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            status: status.to_string(),
            message: message.to_string(),
            cancelled_by,
        };
        let patient_email = appointment.booking_snapshot.patient_email.clone();
        let email = email.map(|(subject, body)| (subject.to_string(), body));

        tokio::spawn(async move {
            gateway.emit(room, &event).await;
            gateway.emit(room, &RealtimeEvent::NewNotification).await;

            if let Some((subject, body)) = email {
                if let Err(e) = mailer.send(&patient_email, &subject, &body, None).await {
                    warn!("Failed to send status email: {}", e);
                }
            }
        });
    }
}
