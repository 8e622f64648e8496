// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Principal;
use shared_models::error::AppError;

use crate::models::NotificationError;
use crate::router::NotificationCellState;

fn map_notification_error(error: NotificationError) -> AppError {
    match error {
        NotificationError::NotFound => AppError::NotFound("Notification not found".to_string()),
        NotificationError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// The recipient is always the caller; there is no cross-principal read.
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<NotificationCellState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let notifications = state
        .notifications
        .list(principal.id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({ "success": true, "notifications": notifications })))
}

#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<Arc<NotificationCellState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let count = state
        .notifications
        .unread_count(principal.id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({ "success": true, "unread": count })))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<Arc<NotificationCellState>>,
    Extension(_principal): Extension<Principal>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state
        .notifications
        .mark_read(notification_id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Notification marked as read"
    })))
}

#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<Arc<NotificationCellState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    state
        .notifications
        .mark_all_read(principal.id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "All notifications marked as read"
    })))
}
