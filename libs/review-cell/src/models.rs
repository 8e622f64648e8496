// libs/review-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_REVIEW_LENGTH: usize = 200;
pub const MAX_RATING: u8 = 5;
/// Days after the appointment date during which a review may be left.
pub const REVIEW_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Uuid,
    pub text: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub doctor_id: Uuid,
    pub appointment_id: Uuid,
    pub text: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditReviewRequest {
    pub text: String,
    pub rating: u8,
}

/// Listing row with the reviewer's display data joined in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub author_name: Option<String>,
    pub author_image_url: Option<String>,
}

/// Derived aggregate written back to the doctor record after every
/// create, edit or delete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub count: u64,
    pub average: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Review not found")]
    NotFound,

    #[error("You can only review after completing an appointment")]
    NotEligible,

    #[error("You can only review within {REVIEW_WINDOW_DAYS} days of the appointment")]
    WindowExpired,

    #[error("This appointment has already been reviewed")]
    AlreadyReviewed,

    #[error("You are not authorized to modify this review")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
