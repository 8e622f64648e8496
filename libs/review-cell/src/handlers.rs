// libs/review-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Principal;
use shared_models::error::AppError;

use crate::models::{CreateReviewRequest, EditReviewRequest, ReviewError};
use crate::router::ReviewCellState;

fn map_review_error(error: ReviewError) -> AppError {
    match error {
        ReviewError::NotFound => AppError::NotFound("Review not found".to_string()),
        ReviewError::NotEligible | ReviewError::WindowExpired | ReviewError::AlreadyReviewed => {
            AppError::BadRequest(error.to_string())
        }
        ReviewError::Unauthorized => AppError::Auth(error.to_string()),
        ReviewError::ValidationError(msg) => AppError::BadRequest(msg),
        ReviewError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Public: everyone can read a doctor's reviews.
#[axum::debug_handler]
pub async fn list_doctor_reviews(
    State(state): State<Arc<ReviewCellState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let reviews = state
        .reviews
        .list_for_doctor(doctor_id)
        .await
        .map_err(map_review_error)?;

    Ok(Json(json!({ "success": true, "reviews": reviews })))
}

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<ReviewCellState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<Value>, AppError> {
    let review = state
        .reviews
        .create(&principal, request)
        .await
        .map_err(map_review_error)?;

    Ok(Json(json!({
        "success": true,
        "review": review,
        "message": "Review created successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_review(
    State(state): State<Arc<ReviewCellState>>,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let review = state.reviews.get(review_id).await.map_err(map_review_error)?;

    Ok(Json(json!({ "success": true, "review": review })))
}

#[axum::debug_handler]
pub async fn edit_review(
    State(state): State<Arc<ReviewCellState>>,
    Extension(principal): Extension<Principal>,
    Path(review_id): Path<Uuid>,
    Json(request): Json<EditReviewRequest>,
) -> Result<Json<Value>, AppError> {
    let review = state
        .reviews
        .edit(review_id, &principal, request)
        .await
        .map_err(map_review_error)?;

    Ok(Json(json!({
        "success": true,
        "review": review,
        "message": "Review updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_review(
    State(state): State<Arc<ReviewCellState>>,
    Extension(principal): Extension<Principal>,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state
        .reviews
        .delete(review_id, &principal)
        .await
        .map_err(map_review_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Review deleted successfully"
    })))
}
