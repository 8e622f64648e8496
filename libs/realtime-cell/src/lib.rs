pub mod events;
pub mod gateway;
pub mod handlers;
pub mod router;

pub use events::RealtimeEvent;
pub use gateway::RealtimeGateway;
pub use router::realtime_routes;
