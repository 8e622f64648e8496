use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::warn;

use appointment_cell::router::AppointmentCellState;
use appointment_cell::services::booking::BookingService;
use appointment_cell::services::lifecycle::LifecycleService;
use appointment_cell::services::locks::DoctorSlotLocks;
use doctor_cell::router::DoctorCellState;
use doctor_cell::services::directory::DoctorDirectoryService;
use notification_cell::router::NotificationCellState;
use notification_cell::NotificationService;
use patient_cell::router::PatientCellState;
use patient_cell::services::patient::PatientService;
use realtime_cell::router::RealtimeCellState;
use realtime_cell::RealtimeGateway;
use review_cell::router::ReviewCellState;
use review_cell::services::review::ReviewService;
use shared_clients::{
    ImageStore, Mailer, MemoryImageStore, MemoryMailer, RestImageStore, RestMailer,
};
use shared_config::AppConfig;
use shared_store::{DocumentStore, MemoryStore, RestDocumentStore};

/// Wire the collaborator backends and the cell services, then nest each
/// cell's router. The realtime gateway and the per-doctor booking locks
/// are constructed once here and injected; nothing reaches them through
/// globals.
pub fn create_router(config: Arc<AppConfig>) -> Router {
    let store: Arc<dyn DocumentStore> = if config.is_configured() {
        Arc::new(RestDocumentStore::new(&config))
    } else {
        warn!("Document store not configured; using the in-memory store");
        Arc::new(MemoryStore::new())
    };

    let mailer: Arc<dyn Mailer> = if config.is_mail_configured() {
        Arc::new(RestMailer::new(&config))
    } else {
        warn!("Mail service not configured; outbound mail is captured in memory");
        Arc::new(MemoryMailer::new())
    };

    let images: Arc<dyn ImageStore> = if config.is_image_store_configured() {
        Arc::new(RestImageStore::new(&config))
    } else {
        warn!("Image store not configured; using the in-memory stand-in");
        Arc::new(MemoryImageStore::new())
    };

    let gateway = RealtimeGateway::new();
    let locks = DoctorSlotLocks::new();

    let directory = DoctorDirectoryService::new(Arc::clone(&store));
    let patients = PatientService::new(Arc::clone(&store));
    let notifications = NotificationService::new(Arc::clone(&store));
    let reviews = ReviewService::new(Arc::clone(&store), directory.clone());

    let booking = BookingService::new(
        Arc::clone(&store),
        directory.clone(),
        patients.clone(),
        notifications.clone(),
        gateway.clone(),
        Arc::clone(&mailer),
        locks.clone(),
    );
    let lifecycle = LifecycleService::new(
        Arc::clone(&store),
        directory.clone(),
        notifications.clone(),
        gateway.clone(),
        Arc::clone(&mailer),
        images,
        locks,
    );

    Router::new()
        .route("/", get(|| async { "MediBook API is running!" }))
        .nest(
            "/doctors",
            doctor_cell::doctor_routes(Arc::new(DoctorCellState {
                config: config.clone(),
                directory,
            })),
        )
        .nest(
            "/patients",
            patient_cell::patient_routes(Arc::new(PatientCellState {
                config: config.clone(),
                patients,
            })),
        )
        .nest(
            "/appointments",
            appointment_cell::appointment_routes(Arc::new(AppointmentCellState {
                config: config.clone(),
                booking,
                lifecycle,
            })),
        )
        .nest(
            "/notifications",
            notification_cell::notification_routes(Arc::new(NotificationCellState {
                config: config.clone(),
                notifications,
            })),
        )
        .nest(
            "/reviews",
            review_cell::review_routes(Arc::new(ReviewCellState {
                config: config.clone(),
                reviews,
            })),
        )
        .nest(
            "/realtime",
            realtime_cell::realtime_routes(Arc::new(RealtimeCellState { config, gateway })),
        )
}
