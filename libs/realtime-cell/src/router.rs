use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::gateway::RealtimeGateway;
use crate::handlers::ws_handler;

pub struct RealtimeCellState {
    pub config: Arc<AppConfig>,
    pub gateway: RealtimeGateway,
}

pub fn realtime_routes(state: Arc<RealtimeCellState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}
