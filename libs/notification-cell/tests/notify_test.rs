use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;

use notification_cell::{NotificationError, NotificationKind, NotificationService};
use shared_store::{collections, DocumentStore, MemoryStore};

fn service() -> (NotificationService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (NotificationService::new(store.clone()), store)
}

#[tokio::test]
async fn lists_newest_first() {
    let (service, _store) = service();
    let receiver = Uuid::new_v4();
    let sender = Uuid::new_v4();

    for (kind, message) in [
        (NotificationKind::AppointmentRequest, "first"),
        (NotificationKind::AppointmentAccepted, "second"),
        (NotificationKind::AppointmentCompleted, "third"),
    ] {
        service
            .create(sender, receiver, None, kind, message.to_string())
            .await
            .unwrap();
        // Distinct timestamps so the ordering is observable.
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    let listed = service.list(receiver).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].notification.message, "third");
    assert_eq!(listed[2].notification.message, "first");
    assert!(listed.iter().all(|n| !n.notification.is_read));
}

#[tokio::test]
async fn joins_the_appointment_slot() {
    let (service, store) = service();
    let receiver = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    store
        .insert(
            collections::APPOINTMENTS,
            json!({
                "id": appointment_id.to_string(),
                "slot_date": "2025-03-15",
                "slot_time": "10:00:00",
            }),
        )
        .await
        .unwrap();

    service
        .create(
            Uuid::new_v4(),
            receiver,
            Some(appointment_id),
            NotificationKind::AppointmentAccepted,
            "Appointment has been accepted.".to_string(),
        )
        .await
        .unwrap();

    let listed = service.list(receiver).await.unwrap();
    assert_eq!(
        listed[0].slot_date,
        Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
    );
    assert_eq!(
        listed[0].slot_time,
        Some(chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn survives_a_deleted_appointment() {
    let (service, _store) = service();
    let receiver = Uuid::new_v4();

    service
        .create(
            Uuid::new_v4(),
            receiver,
            Some(Uuid::new_v4()),
            NotificationKind::AppointmentCancelledByDoctor,
            "Appointment has been cancelled.".to_string(),
        )
        .await
        .unwrap();

    let listed = service.list(receiver).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].slot_date, None);
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let (service, _store) = service();
    let receiver = Uuid::new_v4();

    let notification = service
        .create(
            Uuid::new_v4(),
            receiver,
            None,
            NotificationKind::AppointmentRequest,
            "New appointment request".to_string(),
        )
        .await
        .unwrap();

    service.mark_read(notification.id).await.unwrap();
    service.mark_read(notification.id).await.unwrap();

    let listed = service.list(receiver).await.unwrap();
    assert!(listed[0].notification.is_read);
    assert_eq!(service.unread_count(receiver).await.unwrap(), 0);
}

#[tokio::test]
async fn marking_an_unknown_notification_fails() {
    let (service, _store) = service();
    assert_matches!(
        service.mark_read(Uuid::new_v4()).await,
        Err(NotificationError::NotFound)
    );
}

#[tokio::test]
async fn mark_all_read_only_touches_the_recipient() {
    let (service, _store) = service();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    for receiver in [first, first, second] {
        service
            .create(
                Uuid::new_v4(),
                receiver,
                None,
                NotificationKind::AppointmentRequest,
                "New appointment request".to_string(),
            )
            .await
            .unwrap();
    }

    let updated = service.mark_all_read(first).await.unwrap();
    assert_eq!(updated, 2);

    assert_eq!(service.unread_count(first).await.unwrap(), 0);
    assert_eq!(service.unread_count(second).await.unwrap(), 1);

    // Idempotent: a second sweep changes nothing observable.
    service.mark_all_read(first).await.unwrap();
    assert_eq!(service.unread_count(first).await.unwrap(), 0);
}
