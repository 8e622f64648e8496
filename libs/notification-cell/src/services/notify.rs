// libs/notification-cell/src/services/notify.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_store::{collections, DocumentStore, Filter};

use crate::models::{Notification, NotificationError, NotificationKind, NotificationWithSlot};

/// Persisted per-recipient lifecycle messages. `create` is awaited by the
/// lifecycle service before any realtime ping goes out, so storage
/// failures propagate instead of being swallowed.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        appointment_id: Option<Uuid>,
        kind: NotificationKind,
        message: String,
    ) -> Result<Notification, NotificationError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            appointment_id,
            kind,
            message,
            is_read: false,
            created_at: Utc::now(),
        };

        let document = serde_json::to_value(&notification)
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;
        self.store
            .insert(collections::NOTIFICATIONS, document)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        debug!(
            "Notification {:?} stored for receiver {}",
            kind, receiver_id
        );
        Ok(notification)
    }

    /// All notifications for one recipient, newest first, with the related
    /// appointment's slot joined in.
    pub async fn list(
        &self,
        receiver_id: Uuid,
    ) -> Result<Vec<NotificationWithSlot>, NotificationError> {
        let filter = Filter::new().eq("receiver_id", receiver_id);
        let documents = self
            .store
            .list(collections::NOTIFICATIONS, &filter)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let mut notifications = Vec::with_capacity(documents.len());
        for document in documents {
            let notification: Notification = serde_json::from_value(document).map_err(|e| {
                NotificationError::DatabaseError(format!("Failed to parse notification: {}", e))
            })?;

            let (slot_date, slot_time) = match notification.appointment_id {
                Some(appointment_id) => self.appointment_slot(appointment_id).await?,
                None => (None, None),
            };

            notifications.push(NotificationWithSlot {
                notification,
                slot_date,
                slot_time,
            });
        }

        notifications.sort_by(|a, b| b.notification.created_at.cmp(&a.notification.created_at));
        Ok(notifications)
    }

    pub async fn unread_count(&self, receiver_id: Uuid) -> Result<u64, NotificationError> {
        self.store
            .count(
                collections::NOTIFICATIONS,
                &Filter::new()
                    .eq("receiver_id", receiver_id)
                    .eq("is_read", false),
            )
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))
    }

    /// Idempotent: marking an already-read notification is a no-op.
    pub async fn mark_read(&self, notification_id: Uuid) -> Result<(), NotificationError> {
        self.store
            .update(
                collections::NOTIFICATIONS,
                notification_id,
                json!({ "is_read": true }),
            )
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound { .. } => NotificationError::NotFound,
                other => NotificationError::DatabaseError(other.to_string()),
            })?;
        Ok(())
    }

    /// Idempotent bulk variant of `mark_read`.
    pub async fn mark_all_read(&self, receiver_id: Uuid) -> Result<u64, NotificationError> {
        self.store
            .update_many(
                collections::NOTIFICATIONS,
                &Filter::new().eq("receiver_id", receiver_id),
                json!({ "is_read": true }),
            )
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))
    }

    async fn appointment_slot(
        &self,
        appointment_id: Uuid,
    ) -> Result<
        (
            Option<chrono::NaiveDate>,
            Option<chrono::NaiveTime>,
        ),
        NotificationError,
    > {
        let Some(appointment) = self
            .store
            .get(collections::APPOINTMENTS, appointment_id)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?
        else {
            // The appointment may have been removed by a doctor-deletion
            // cascade; the notification itself stays readable.
            return Ok((None, None));
        };

        let slot_date = appointment
            .get("slot_date")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok());
        let slot_time = appointment
            .get("slot_time")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok());
        Ok((slot_date, slot_time))
    }
}
