mod common;

use assert_matches::assert_matches;
use chrono::NaiveTime;
use tokio::time::{timeout, Duration};

use appointment_cell::models::{AppointmentError, AppointmentStatus};
use common::*;

#[tokio::test]
async fn books_a_free_slot_and_reserves_it_in_the_ledger() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    let appointment = harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.amount, doctor.fees);
    assert_eq!(appointment.booking_snapshot.doctor_name, "Ada Voss");
    assert_eq!(appointment.booking_snapshot.doctor_fees, doctor.fees);
    assert!(!appointment.payment);

    let stored = harness.doctors.get(doctor.id).await.unwrap();
    assert!(stored.slots_booked.is_booked(slot_date(), slot_time()));
}

#[tokio::test]
async fn rejects_a_taken_slot() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let first = harness.seed_patient("Mara Lindqvist").await;
    let second = harness.seed_patient("Jonas Brandt").await;

    harness
        .booking
        .book(book_request(&first, &doctor, slot_date(), slot_time()))
        .await
        .unwrap();

    let result = harness
        .booking
        .book(book_request(&second, &doctor, slot_date(), slot_time()))
        .await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));
}

#[tokio::test]
async fn released_slots_can_be_rebooked() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    let appointment = harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await
        .unwrap();

    // Same tuple again fails while the slot is held.
    assert_matches!(
        harness
            .booking
            .book(book_request(&patient, &doctor, slot_date(), slot_time()))
            .await,
        Err(AppointmentError::SlotUnavailable)
    );

    let cancelled = harness
        .lifecycle
        .cancel(appointment.id, &patient_principal(patient.id))
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let stored = harness.doctors.get(doctor.id).await.unwrap();
    assert!(
        stored.slots_booked.booked_times(slot_date()).is_empty(),
        "cancellation must release the slot"
    );

    // Third booking of the same tuple succeeds.
    harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_bookings_for_one_slot_yield_exactly_one_success() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;

    let mut patients = Vec::new();
    for i in 0..8 {
        patients.push(harness.seed_patient(&format!("Patient {}", i)).await);
    }

    let mut handles = Vec::new();
    for patient in &patients {
        let booking = harness.booking.clone();
        let request = book_request(patient, &doctor, slot_date(), slot_time());
        handles.push(tokio::spawn(async move { booking.book(request).await }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task should not panic") {
            Ok(_) => successes += 1,
            Err(AppointmentError::SlotUnavailable) => conflicts += 1,
            Err(other) => panic!("unexpected booking failure: {:?}", other),
        }
    }

    assert_eq!(successes, 1, "exactly one booking may win the slot");
    assert_eq!(conflicts, 7);

    let stored = harness.doctors.get(doctor.id).await.unwrap();
    assert_eq!(
        stored.slots_booked.booked_times(slot_date()),
        vec![slot_time()],
        "the ledger must hold the slot exactly once"
    );
}

#[tokio::test]
async fn rejects_an_unavailable_doctor() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    harness.doctors.set_availability(doctor.id, false).await.unwrap();

    let result = harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await;
    assert_matches!(result, Err(AppointmentError::DoctorUnavailable));
}

#[tokio::test]
async fn rejects_a_blocked_patient() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    harness.patients.set_blocked(patient.id, true).await.unwrap();

    let result = harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await;
    assert_matches!(result, Err(AppointmentError::PatientBlocked));
}

#[tokio::test]
async fn enforces_the_open_appointment_cap() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    for hour in 9..14 {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        harness
            .booking
            .book(book_request(&patient, &doctor, slot_date(), time))
            .await
            .unwrap();
    }

    let sixth = harness
        .booking
        .book(book_request(
            &patient,
            &doctor,
            slot_date(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        ))
        .await;
    assert_matches!(sixth, Err(AppointmentError::BookingLimitExceeded));
}

#[tokio::test]
async fn enforces_the_recent_cancellation_cap() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    for _ in 0..3 {
        let appointment = harness
            .booking
            .book(book_request(&patient, &doctor, slot_date(), slot_time()))
            .await
            .unwrap();
        harness
            .lifecycle
            .cancel(appointment.id, &patient_principal(patient.id))
            .await
            .unwrap();
    }

    let fourth = harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await;
    assert_matches!(fourth, Err(AppointmentError::TooManyRecentCancellations));
}

#[tokio::test]
async fn doctor_cancellations_do_not_count_against_the_patient() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    for _ in 0..3 {
        let appointment = harness
            .booking
            .book(book_request(&patient, &doctor, slot_date(), slot_time()))
            .await
            .unwrap();
        harness
            .lifecycle
            .cancel(appointment.id, &doctor_principal(doctor.id))
            .await
            .unwrap();
    }

    harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await
        .expect("doctor-side cancellations must not trip the patient's limit");
}

#[tokio::test]
async fn booking_pings_the_doctor_room_and_emails_the_patient() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    let mut doctor_room = harness.gateway.join(doctor.id).await;

    harness
        .booking
        .book(book_request(&patient, &doctor, slot_date(), slot_time()))
        .await
        .unwrap();

    let event = timeout(Duration::from_secs(1), doctor_room.recv())
        .await
        .expect("doctor room should be pinged")
        .unwrap();
    assert!(event.contains("new_appointment"));
    assert!(event.contains("Mara Lindqvist"));

    // The confirmation email is dispatched in the background.
    timeout(Duration::from_secs(1), async {
        loop {
            if !harness.mailer.sent().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("confirmation email should be captured");

    let sent = harness.mailer.sent().await;
    assert_eq!(sent[0].to, patient.email);
    assert!(sent[0].body_text.contains("Ada Voss"));
    assert!(sent[0].body_text.contains("15/03/2025"));
}

#[tokio::test]
async fn rejects_an_incomplete_intake_form() {
    let harness = harness();
    let doctor = harness.seed_doctor("Ada Voss").await;
    let patient = harness.seed_patient("Mara Lindqvist").await;

    let mut request = book_request(&patient, &doctor, slot_date(), slot_time());
    request.patient.reason = String::new();

    assert_matches!(
        harness.booking.book(request).await,
        Err(AppointmentError::ValidationError(_))
    );
}
