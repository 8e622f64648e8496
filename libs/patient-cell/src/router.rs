use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{get_profile, list_patients, register_patient, set_blocked, update_profile};
use crate::services::patient::PatientService;

pub struct PatientCellState {
    pub config: Arc<AppConfig>,
    pub patients: PatientService,
}

pub fn patient_routes(state: Arc<PatientCellState>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(list_patients))
        .route("/register", post(register_patient))
        .route("/{patient_id}", get(get_profile))
        .route("/{patient_id}/profile", patch(update_profile))
        .route("/{patient_id}/blocked", post(set_blocked))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
