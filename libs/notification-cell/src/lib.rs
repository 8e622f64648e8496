pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Notification, NotificationError, NotificationKind};
pub use router::notification_routes;
pub use services::notify::NotificationService;
