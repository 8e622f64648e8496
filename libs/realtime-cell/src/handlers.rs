// libs/realtime-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use shared_models::auth::Principal;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::gateway::RealtimeGateway;
use crate::router::RealtimeCellState;

#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: String,
}

/// WebSocket entry point. Browsers cannot set headers on WS handshakes, so
/// the bearer token arrives as a query parameter. The client joins exactly
/// one room: its own principal id.
#[axum::debug_handler]
pub async fn ws_handler(
    State(state): State<Arc<RealtimeCellState>>,
    Query(params): Query<WsAuthParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let principal =
        validate_token(&params.token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    info!("Realtime connection for principal {}", principal.id);
    let gateway = state.gateway.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, gateway, principal)))
}

async fn handle_socket(socket: WebSocket, gateway: RealtimeGateway, principal: Principal) {
    let mut room = gateway.join(principal.id).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = room.recv() => match event {
                Ok(message) => {
                    if sink.send(Message::Text(message.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Clients re-fetch on the next signal, so lag is safe.
                    warn!("Room {} lagged, {} events skipped", principal.id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // The channel is push-only; client frames are ignored.
                }
                Some(Err(e)) => {
                    debug!("WebSocket error for {}: {}", principal.id, e);
                    break;
                }
            },
        }
    }

    drop(room);
    gateway.prune(principal.id).await;
    info!("Realtime connection closed for principal {}", principal.id);
}
