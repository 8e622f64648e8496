use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{create_review, delete_review, edit_review, get_review, list_doctor_reviews};
use crate::services::review::ReviewService;

pub struct ReviewCellState {
    pub config: Arc<AppConfig>,
    pub reviews: ReviewService,
}

pub fn review_routes(state: Arc<ReviewCellState>) -> Router {
    let public_routes = Router::new().route("/doctor/{doctor_id}", get(list_doctor_reviews));

    let protected_routes = Router::new()
        .route("/", post(create_review))
        .route(
            "/{review_id}",
            get(get_review).patch(edit_review).delete(delete_review),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
