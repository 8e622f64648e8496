use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentStatus, BookingSnapshot, PatientIntake,
};
use doctor_cell::models::CreateDoctorRequest;
use doctor_cell::services::directory::DoctorDirectoryService;
use review_cell::models::{CreateReviewRequest, EditReviewRequest, ReviewError};
use review_cell::services::review::ReviewService;
use shared_models::auth::{Principal, Role};
use shared_store::{collections, DocumentStore, MemoryStore};

struct Setup {
    store: Arc<MemoryStore>,
    doctors: DoctorDirectoryService,
    reviews: ReviewService,
}

fn setup() -> Setup {
    let store = Arc::new(MemoryStore::new());
    let doctors = DoctorDirectoryService::new(store.clone());
    let reviews = ReviewService::new(store.clone(), doctors.clone());
    Setup {
        store,
        doctors,
        reviews,
    }
}

fn principal(id: Uuid, role: Role) -> Principal {
    Principal {
        id,
        role,
        email: None,
        issued_at: None,
    }
}

impl Setup {
    async fn seed_doctor(&self) -> Uuid {
        self.doctors
            .create(CreateDoctorRequest {
                name: "Ada Voss".to_string(),
                email: "ada.voss@clinic.example".to_string(),
                specialty: "Dermatology".to_string(),
                degree: "MD".to_string(),
                experience: "8 years".to_string(),
                about: "Skin specialist".to_string(),
                fees: 5000,
                address: "12 Harley Street".to_string(),
                image_url: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_appointment(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        status: AppointmentStatus,
        days_ago: i64,
    ) -> Uuid {
        let slot_date = (Utc::now() - ChronoDuration::days(days_ago)).date_naive();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            slot_date,
            slot_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            amount: 5000,
            payment: false,
            status,
            cancelled_by: None,
            cancelled_at: None,
            is_reviewed: false,
            remedy_sent: false,
            remedy_image_url: None,
            patient: PatientIntake {
                name: "Mara Lindqvist".to_string(),
                phone: "0123456789".to_string(),
                dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                gender: "female".to_string(),
                reason: "Rash".to_string(),
                address: "1 Elm Row".to_string(),
            },
            booking_snapshot: BookingSnapshot {
                doctor_name: "Ada Voss".to_string(),
                doctor_specialty: "Dermatology".to_string(),
                doctor_fees: 5000,
                patient_name: "Mara Lindqvist".to_string(),
                patient_email: "mara@example.com".to_string(),
            },
            created_at: Utc::now(),
        };
        self.store
            .insert(
                collections::APPOINTMENTS,
                serde_json::to_value(&appointment).unwrap(),
            )
            .await
            .unwrap();
        appointment.id
    }
}

fn review_request(doctor_id: Uuid, appointment_id: Uuid, rating: u8) -> CreateReviewRequest {
    CreateReviewRequest {
        doctor_id,
        appointment_id,
        text: "Very thorough and kind".to_string(),
        rating,
    }
}

#[tokio::test]
async fn reviews_a_completed_appointment_and_updates_the_aggregate() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = setup
        .seed_appointment(doctor_id, patient_id, AppointmentStatus::Completed, 5)
        .await;

    let review = setup
        .reviews
        .create(
            &principal(patient_id, Role::Patient),
            review_request(doctor_id, appointment_id, 5),
        )
        .await
        .unwrap();

    let doctor = setup.doctors.get(doctor_id).await.unwrap();
    assert_eq!(doctor.total_rating, 1);
    assert!((doctor.average_rating - 5.0).abs() < f64::EPSILON);
    assert_eq!(doctor.review_ids, vec![review.id]);

    let appointment = setup
        .store
        .get(collections::APPOINTMENTS, appointment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(appointment.get("is_reviewed"), Some(&serde_json::json!(true)));
}

#[tokio::test]
async fn rejects_a_review_before_completion() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = setup
        .seed_appointment(doctor_id, patient_id, AppointmentStatus::Confirmed, 1)
        .await;

    assert_matches!(
        setup
            .reviews
            .create(
                &principal(patient_id, Role::Patient),
                review_request(doctor_id, appointment_id, 4),
            )
            .await,
        Err(ReviewError::NotEligible)
    );
}

#[tokio::test]
async fn rejects_a_review_for_someone_elses_appointment() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let appointment_id = setup
        .seed_appointment(doctor_id, Uuid::new_v4(), AppointmentStatus::Completed, 1)
        .await;

    assert_matches!(
        setup
            .reviews
            .create(
                &principal(Uuid::new_v4(), Role::Patient),
                review_request(doctor_id, appointment_id, 4),
            )
            .await,
        Err(ReviewError::NotEligible)
    );
}

#[tokio::test]
async fn rejects_a_review_outside_the_window() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = setup
        .seed_appointment(doctor_id, patient_id, AppointmentStatus::Completed, 40)
        .await;

    assert_matches!(
        setup
            .reviews
            .create(
                &principal(patient_id, Role::Patient),
                review_request(doctor_id, appointment_id, 5),
            )
            .await,
        Err(ReviewError::WindowExpired)
    );
}

#[tokio::test]
async fn each_appointment_is_reviewed_exactly_once() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = setup
        .seed_appointment(doctor_id, patient_id, AppointmentStatus::Completed, 2)
        .await;
    let author = principal(patient_id, Role::Patient);

    setup
        .reviews
        .create(&author, review_request(doctor_id, appointment_id, 4))
        .await
        .unwrap();

    assert_matches!(
        setup
            .reviews
            .create(&author, review_request(doctor_id, appointment_id, 4))
            .await,
        Err(ReviewError::AlreadyReviewed)
    );
}

#[tokio::test]
async fn aggregate_tracks_create_edit_and_delete() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;

    let mut review_ids = Vec::new();
    for rating in [5, 3] {
        let patient_id = Uuid::new_v4();
        let appointment_id = setup
            .seed_appointment(doctor_id, patient_id, AppointmentStatus::Completed, 1)
            .await;
        let review = setup
            .reviews
            .create(
                &principal(patient_id, Role::Patient),
                review_request(doctor_id, appointment_id, rating),
            )
            .await
            .unwrap();
        review_ids.push((review.id, patient_id));
    }

    let doctor = setup.doctors.get(doctor_id).await.unwrap();
    assert_eq!(doctor.total_rating, 2);
    assert!((doctor.average_rating - 4.0).abs() < 1e-9);

    // Editing the 3 up to 5 moves the mean to 5.
    let (second_id, second_author) = review_ids[1];
    setup
        .reviews
        .edit(
            second_id,
            &principal(second_author, Role::Patient),
            EditReviewRequest {
                text: "Even better on reflection".to_string(),
                rating: 5,
            },
        )
        .await
        .unwrap();
    let doctor = setup.doctors.get(doctor_id).await.unwrap();
    assert!((doctor.average_rating - 5.0).abs() < 1e-9);

    // Deleting one leaves a single 5 and prunes the id list.
    setup
        .reviews
        .delete(second_id, &principal(second_author, Role::Patient))
        .await
        .unwrap();
    let doctor = setup.doctors.get(doctor_id).await.unwrap();
    assert_eq!(doctor.total_rating, 1);
    assert!((doctor.average_rating - 5.0).abs() < 1e-9);
    assert_eq!(doctor.review_ids.len(), 1);
}

#[tokio::test]
async fn recompute_is_idempotent() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = setup
        .seed_appointment(doctor_id, patient_id, AppointmentStatus::Completed, 1)
        .await;
    setup
        .reviews
        .create(
            &principal(patient_id, Role::Patient),
            review_request(doctor_id, appointment_id, 4),
        )
        .await
        .unwrap();

    let first = setup.reviews.recompute_rating(doctor_id).await.unwrap();
    let second = setup.reviews.recompute_rating(doctor_id).await.unwrap();
    assert_eq!(first, second);

    let doctor = setup.doctors.get(doctor_id).await.unwrap();
    assert_eq!(doctor.total_rating, first.count as i64);
}

#[tokio::test]
async fn only_the_author_or_admin_may_delete() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = setup
        .seed_appointment(doctor_id, patient_id, AppointmentStatus::Completed, 1)
        .await;
    let review = setup
        .reviews
        .create(
            &principal(patient_id, Role::Patient),
            review_request(doctor_id, appointment_id, 4),
        )
        .await
        .unwrap();

    assert_matches!(
        setup
            .reviews
            .delete(review.id, &principal(Uuid::new_v4(), Role::Patient))
            .await,
        Err(ReviewError::Unauthorized)
    );

    setup
        .reviews
        .delete(review.id, &principal(Uuid::new_v4(), Role::Admin))
        .await
        .expect("admin may delete any review");
}

#[tokio::test]
async fn rejects_out_of_range_content() {
    let setup = setup();
    let doctor_id = setup.seed_doctor().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = setup
        .seed_appointment(doctor_id, patient_id, AppointmentStatus::Completed, 1)
        .await;
    let author = principal(patient_id, Role::Patient);

    let mut over_rating = review_request(doctor_id, appointment_id, 6);
    assert_matches!(
        setup.reviews.create(&author, over_rating.clone()).await,
        Err(ReviewError::ValidationError(_))
    );

    over_rating.rating = 4;
    over_rating.text = "x".repeat(201);
    assert_matches!(
        setup.reviews.create(&author, over_rating).await,
        Err(ReviewError::ValidationError(_))
    );
}
