use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{
    accept_appointment, book_appointment, cancel_appointment, complete_appointment,
    get_appointment, list_all_appointments, list_doctor_appointments, list_patient_appointments,
    send_remedy, view_remedy,
};
use crate::services::booking::BookingService;
use crate::services::lifecycle::LifecycleService;

pub struct AppointmentCellState {
    pub config: Arc<AppConfig>,
    pub booking: BookingService,
    pub lifecycle: LifecycleService,
}

pub fn appointment_routes(state: Arc<AppointmentCellState>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(list_all_appointments))
        .route("/book", post(book_appointment))
        .route("/patient/{patient_id}", get(list_patient_appointments))
        .route("/doctor/{doctor_id}", get(list_doctor_appointments))
        .route("/{appointment_id}", get(get_appointment))
        .route("/{appointment_id}/accept", post(accept_appointment))
        .route("/{appointment_id}/complete", post(complete_appointment))
        .route("/{appointment_id}/cancel", post(cancel_appointment))
        .route("/{appointment_id}/remedy", post(send_remedy).get(view_remedy))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
