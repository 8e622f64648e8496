use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::RealtimeEvent;

pub type RoomReceiver = broadcast::Receiver<String>;

const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Room-per-principal pub/sub. Each connected client joins the room named
/// by its own id; server-side emits always target a single room. The
/// registry is process-local and rebuilt from live connections, so it
/// carries no durable state.
pub struct RealtimeGateway {
    rooms: Arc<RwLock<HashMap<Uuid, broadcast::Sender<String>>>>,
}

impl RealtimeGateway {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to a room, creating it on first join. Every subscriber of
    /// the same room receives every emit.
    pub async fn join(&self, room: Uuid) -> RoomReceiver {
        let mut rooms = self.rooms.write().await;
        let sender = rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0);
        debug!("Principal joined room {}", room);
        sender.subscribe()
    }

    /// Emit an event to one room. Best-effort: an empty or missing room is
    /// not an error, the next poll or reconnect re-fetches full state.
    pub async fn emit(&self, room: Uuid, event: &RealtimeEvent) {
        let message = match serde_json::to_string(event) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to encode realtime event for room {}: {}", room, e);
                return;
            }
        };

        let rooms = self.rooms.read().await;
        match rooms.get(&room) {
            Some(sender) => {
                if let Err(e) = sender.send(message) {
                    debug!("No live subscribers in room {}: {}", room, e);
                }
            }
            None => {
                debug!("Dropping event for room {} with no subscribers", room);
            }
        }
    }

    /// Drop the room's channel once its last subscriber disconnected.
    pub async fn prune(&self, room: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(sender) = rooms.get(&room) {
            if sender.receiver_count() == 0 {
                rooms.remove(&room);
                debug!("Pruned empty room {}", room);
            }
        }
    }

    pub async fn active_rooms(&self) -> Vec<Uuid> {
        let rooms = self.rooms.read().await;
        rooms.keys().copied().collect()
    }
}

impl Default for RealtimeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RealtimeGateway {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
        }
    }
}
