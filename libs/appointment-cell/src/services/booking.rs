// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Timelike, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use doctor_cell::services::directory::DoctorDirectoryService;
use notification_cell::{NotificationKind, NotificationService};
use patient_cell::models::PatientError;
use patient_cell::services::patient::PatientService;
use realtime_cell::{RealtimeEvent, RealtimeGateway};
use shared_clients::Mailer;
use shared_store::{collections, DocumentStore, Filter};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, BookingLimits,
    BookingSnapshot,
};
use crate::services::locks::DoctorSlotLocks;

pub struct BookingService {
    store: Arc<dyn DocumentStore>,
    doctors: DoctorDirectoryService,
    patients: PatientService,
    notifications: NotificationService,
    gateway: RealtimeGateway,
    mailer: Arc<dyn Mailer>,
    locks: DoctorSlotLocks,
    limits: BookingLimits,
}

impl BookingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        doctors: DoctorDirectoryService,
        patients: PatientService,
        notifications: NotificationService,
        gateway: RealtimeGateway,
        mailer: Arc<dyn Mailer>,
        locks: DoctorSlotLocks,
    ) -> Self {
        Self {
            store,
            doctors,
            patients,
            notifications,
            gateway,
            mailer,
            locks,
            limits: BookingLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: BookingLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Reserve a slot and create the appointment. Precondition checks run
    /// in a fixed order; the slot check and the ledger write happen under
    /// the doctor's booking lock so concurrent attempts on the same tuple
    /// resolve to exactly one success.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        self.validate_intake(&request)?;

        // Step 1: doctor must exist and be accepting bookings.
        let doctor = self
            .doctors
            .get(request.doctor_id)
            .await
            .map_err(map_doctor_error)?;
        if !doctor.available {
            return Err(AppointmentError::DoctorUnavailable);
        }

        let patient = self
            .patients
            .get(request.patient_id)
            .await
            .map_err(map_patient_error)?;
        if patient.is_blocked {
            warn!("Blocked patient {} attempted to book", patient.id);
            return Err(AppointmentError::PatientBlocked);
        }

        // Step 2: cap on simultaneously open appointments.
        let active = self
            .store
            .count(
                collections::APPOINTMENTS,
                &Filter::new()
                    .eq("patient_id", request.patient_id)
                    .ne("status", AppointmentStatus::Cancelled.to_string())
                    .ne("status", AppointmentStatus::Completed.to_string()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if active >= self.limits.max_active_appointments {
            return Err(AppointmentError::BookingLimitExceeded);
        }

        // Step 3: cap on patient-initiated cancellations in the window.
        let window_start = Utc::now() - ChronoDuration::hours(self.limits.cancellation_window_hours);
        let window_start = window_start.with_nanosecond(0).unwrap_or(window_start);
        let recent_cancellations = self
            .store
            .count(
                collections::APPOINTMENTS,
                &Filter::new()
                    .eq("patient_id", request.patient_id)
                    .eq("cancelled_by", "patient")
                    .gte("cancelled_at", window_start),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if recent_cancellations >= self.limits.max_recent_cancellations {
            return Err(AppointmentError::TooManyRecentCancellations);
        }

        // Step 4: slot check and reservation, serialized per doctor.
        let _guard = self.locks.acquire(request.doctor_id).await;

        let mut current = self
            .doctors
            .get(request.doctor_id)
            .await
            .map_err(map_doctor_error)?;
        if !current
            .slots_booked
            .book(request.slot_date, request.slot_time)
        {
            debug!(
                "Slot {} {} already booked for doctor {}",
                request.slot_date, request.slot_time, request.doctor_id
            );
            return Err(AppointmentError::SlotUnavailable);
        }
        self.doctors
            .save_ledger(request.doctor_id, &current.slots_booked)
            .await
            .map_err(map_doctor_error)?;

        let now = Utc::now().with_nanosecond(0).unwrap_or_else(Utc::now);
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            slot_date: request.slot_date,
            slot_time: request.slot_time,
            amount: current.fees,
            payment: false,
            status: AppointmentStatus::Pending,
            cancelled_by: None,
            cancelled_at: None,
            is_reviewed: false,
            remedy_sent: false,
            remedy_image_url: None,
            patient: request.patient,
            booking_snapshot: BookingSnapshot {
                doctor_name: current.name.clone(),
                doctor_specialty: current.specialty.clone(),
                doctor_fees: current.fees,
                patient_name: patient.name.clone(),
                patient_email: patient.email.clone(),
            },
            created_at: now,
        };

        let document = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if let Err(e) = self.store.insert(collections::APPOINTMENTS, document).await {
            // Give the slot back rather than leaving a phantom reservation.
            current
                .slots_booked
                .release(request.slot_date, request.slot_time);
            if let Err(rollback) = self
                .doctors
                .save_ledger(request.doctor_id, &current.slots_booked)
                .await
            {
                warn!(
                    "Failed to roll back slot ledger for doctor {}: {}",
                    request.doctor_id, rollback
                );
            }
            return Err(AppointmentError::DatabaseError(e.to_string()));
        }

        drop(_guard);

        self.dispatch_booking_side_effects(&appointment);

        info!(
            "Appointment {} booked with doctor {}",
            appointment.id, appointment.doctor_id
        );
        Ok(appointment)
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let document = self
            .store
            .get(collections::APPOINTMENTS, appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)?;

        parse_appointment(document)
    }

    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list(Filter::new().eq("patient_id", patient_id)).await
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list(Filter::new().eq("doctor_id", doctor_id)).await
    }

    pub async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.list(Filter::new()).await
    }

    async fn list(&self, filter: Filter) -> Result<Vec<Appointment>, AppointmentError> {
        let documents = self
            .store
            .list(collections::APPOINTMENTS, &filter)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        documents.into_iter().map(parse_appointment).collect()
    }

    fn validate_intake(&self, request: &BookAppointmentRequest) -> Result<(), AppointmentError> {
        let intake = &request.patient;
        if intake.name.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Patient name is required".to_string(),
            ));
        }
        if intake.phone.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Patient phone is required".to_string(),
            ));
        }
        if intake.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Reason for the visit is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Realtime ping, stored notification and confirmation email run on a
    /// background task: their outcome never changes the booking result.
    fn dispatch_booking_side_effects(&self, appointment: &Appointment) {
        let gateway = self.gateway.clone();
        let notifications = self.notifications.clone();
        let mailer = Arc::clone(&self.mailer);
        let appointment = appointment.clone();

        tokio::spawn(async move {
            gateway
                .emit(
                    appointment.doctor_id,
                    &RealtimeEvent::NewAppointment {
                        appointment_id: appointment.id,
                        doctor_id: appointment.doctor_id,
                        patient_name: appointment.booking_snapshot.patient_name.clone(),
                        slot_date: appointment.slot_date,
                        slot_time: appointment.slot_time,
                    },
                )
                .await;

            match notifications
                .create(
                    appointment.patient_id,
                    appointment.doctor_id,
                    Some(appointment.id),
                    NotificationKind::AppointmentRequest,
                    format!(
                        "New appointment request from {} for {} at {}.",
                        appointment.booking_snapshot.patient_name,
                        appointment.slot_date_display(),
                        appointment.slot_time_display()
                    ),
                )
                .await
            {
                Ok(_) => {
                    gateway
                        .emit(appointment.doctor_id, &RealtimeEvent::NewNotification)
                        .await;
                }
                Err(e) => warn!(
                    "Failed to store booking notification for appointment {}: {}",
                    appointment.id, e
                ),
            }

            let body = format!(
                "Doctor: {}\nTime: {}\nDate: {}\nStatus: Pending - A new appointment is waiting for confirmation",
                appointment.booking_snapshot.doctor_name,
                appointment.slot_time_display(),
                appointment.slot_date_display()
            );
            if let Err(e) = mailer
                .send(
                    &appointment.booking_snapshot.patient_email,
                    "Appointment booked",
                    &body,
                    None,
                )
                .await
            {
                warn!(
                    "Failed to send booking confirmation for appointment {}: {}",
                    appointment.id, e
                );
            }
        });
    }
}

pub(crate) fn parse_appointment(document: Value) -> Result<Appointment, AppointmentError> {
    serde_json::from_value(document)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}

pub(crate) fn map_doctor_error(error: DoctorError) -> AppointmentError {
    match error {
        DoctorError::NotFound => AppointmentError::DoctorNotFound,
        DoctorError::ValidationError(msg) => AppointmentError::ValidationError(msg),
        DoctorError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
    }
}

pub(crate) fn map_patient_error(error: PatientError) -> AppointmentError {
    match error {
        PatientError::NotFound => AppointmentError::PatientNotFound,
        PatientError::ValidationError(msg) => AppointmentError::ValidationError(msg),
        PatientError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
    }
}
