use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{
    add_doctor, admin_dashboard, delete_doctor, doctor_dashboard, get_doctor, list_doctors,
    patient_roster, set_availability, update_profile,
};
use crate::services::directory::DoctorDirectoryService;

pub struct DoctorCellState {
    pub config: Arc<AppConfig>,
    pub directory: DoctorDirectoryService,
}

pub fn doctor_routes(state: Arc<DoctorCellState>) -> Router {
    let public_routes = Router::new()
        .route("/", get(list_doctors))
        .route("/{doctor_id}", get(get_doctor));

    let protected_routes = Router::new()
        .route("/add", post(add_doctor))
        .route("/admin/{doctor_id}", delete(delete_doctor))
        .route("/{doctor_id}/availability", post(set_availability))
        .route("/{doctor_id}/profile", patch(update_profile))
        .route("/{doctor_id}/dashboard", get(doctor_dashboard))
        .route("/{doctor_id}/patients", get(patient_roster))
        .route("/admin/dashboard", get(admin_dashboard))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
