use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{list_notifications, mark_all_read, mark_read, unread_count};
use crate::services::notify::NotificationService;

pub struct NotificationCellState {
    pub config: Arc<AppConfig>,
    pub notifications: NotificationService,
}

pub fn notification_routes(state: Arc<NotificationCellState>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{notification_id}/read", post(mark_read))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
