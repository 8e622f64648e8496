use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::models::{BookAppointmentRequest, PatientIntake};
use appointment_cell::services::booking::BookingService;
use appointment_cell::services::lifecycle::LifecycleService;
use appointment_cell::services::locks::DoctorSlotLocks;
use doctor_cell::models::{CreateDoctorRequest, Doctor};
use doctor_cell::services::directory::DoctorDirectoryService;
use notification_cell::NotificationService;
use patient_cell::models::{CreatePatientRequest, Patient};
use patient_cell::services::patient::PatientService;
use realtime_cell::RealtimeGateway;
use shared_clients::{ImageStore, Mailer, MemoryImageStore, MemoryMailer};
use shared_models::auth::{Principal, Role};
use shared_store::MemoryStore;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub doctors: DoctorDirectoryService,
    pub patients: PatientService,
    pub notifications: NotificationService,
    pub gateway: RealtimeGateway,
    pub mailer: Arc<MemoryMailer>,
    pub booking: Arc<BookingService>,
    pub lifecycle: Arc<LifecycleService>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let doctors = DoctorDirectoryService::new(store.clone());
    let patients = PatientService::new(store.clone());
    let notifications = NotificationService::new(store.clone());
    let gateway = RealtimeGateway::new();
    let mailer = Arc::new(MemoryMailer::new());
    let locks = DoctorSlotLocks::new();

    let booking = Arc::new(BookingService::new(
        store.clone(),
        doctors.clone(),
        patients.clone(),
        notifications.clone(),
        gateway.clone(),
        Arc::clone(&mailer) as Arc<dyn Mailer>,
        locks.clone(),
    ));
    let lifecycle = Arc::new(LifecycleService::new(
        store.clone(),
        doctors.clone(),
        notifications.clone(),
        gateway.clone(),
        Arc::clone(&mailer) as Arc<dyn Mailer>,
        Arc::new(MemoryImageStore::new()) as Arc<dyn ImageStore>,
        locks,
    ));

    Harness {
        store,
        doctors,
        patients,
        notifications,
        gateway,
        mailer,
        booking,
        lifecycle,
    }
}

impl Harness {
    pub async fn seed_doctor(&self, name: &str) -> Doctor {
        self.doctors
            .create(CreateDoctorRequest {
                name: name.to_string(),
                email: format!("{}@clinic.example", name.to_lowercase().replace(' ', ".")),
                specialty: "Dermatology".to_string(),
                degree: "MD".to_string(),
                experience: "8 years".to_string(),
                about: "Skin specialist".to_string(),
                fees: 5000,
                address: "12 Harley Street".to_string(),
                image_url: None,
            })
            .await
            .expect("seed doctor")
    }

    pub async fn seed_patient(&self, name: &str) -> Patient {
        self.patients
            .create(CreatePatientRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            })
            .await
            .expect("seed patient")
    }
}

pub fn slot_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date")
}

pub fn slot_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).expect("valid time")
}

pub fn intake(name: &str) -> PatientIntake {
    PatientIntake {
        name: name.to_string(),
        phone: "0123456789".to_string(),
        dob: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid date"),
        gender: "female".to_string(),
        reason: "Persistent rash".to_string(),
        address: "1 Elm Row".to_string(),
    }
}

pub fn book_request(
    patient: &Patient,
    doctor: &Doctor,
    date: NaiveDate,
    time: NaiveTime,
) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id: patient.id,
        doctor_id: doctor.id,
        slot_date: date,
        slot_time: time,
        patient: intake(&patient.name),
    }
}

pub fn patient_principal(id: Uuid) -> Principal {
    Principal {
        id,
        role: Role::Patient,
        email: None,
        issued_at: None,
    }
}

pub fn doctor_principal(id: Uuid) -> Principal {
    Principal {
        id,
        role: Role::Doctor,
        email: None,
        issued_at: None,
    }
}

pub fn admin_principal() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        role: Role::Admin,
        email: None,
        issued_at: None,
    }
}
