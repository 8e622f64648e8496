// libs/review-cell/src/services/review.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus};
use doctor_cell::services::directory::DoctorDirectoryService;
use shared_models::auth::Principal;
use shared_store::{collections, DocumentStore, Filter};

use crate::models::{
    CreateReviewRequest, EditReviewRequest, RatingAggregate, Review, ReviewError,
    ReviewWithAuthor, MAX_RATING, MAX_REVIEW_LENGTH, REVIEW_WINDOW_DAYS,
};

/// Post-completion feedback. Eligibility is checked against the
/// appointment record; every mutation ends in an aggregate recompute so
/// the doctor's cached rating never drifts from the review collection.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn DocumentStore>,
    doctors: DoctorDirectoryService,
}

impl ReviewService {
    pub fn new(store: Arc<dyn DocumentStore>, doctors: DoctorDirectoryService) -> Self {
        Self { store, doctors }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateReviewRequest,
    ) -> Result<Review, ReviewError> {
        let patient_id = principal.patient_id().ok_or(ReviewError::Unauthorized)?;
        self.validate_content(&request.text, request.rating)?;

        let appointment = self.appointment(request.appointment_id).await?;

        // Eligibility: a completed appointment between exactly this
        // patient and doctor.
        if appointment.doctor_id != request.doctor_id
            || appointment.patient_id != patient_id
            || appointment.status != AppointmentStatus::Completed
        {
            return Err(ReviewError::NotEligible);
        }

        let age = Utc::now()
            .date_naive()
            .signed_duration_since(appointment.slot_date);
        if age > ChronoDuration::days(REVIEW_WINDOW_DAYS) {
            return Err(ReviewError::WindowExpired);
        }

        if appointment.is_reviewed {
            return Err(ReviewError::AlreadyReviewed);
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id,
            appointment_id: request.appointment_id,
            text: request.text,
            rating: request.rating,
            created_at: now,
            updated_at: now,
        };

        let document =
            serde_json::to_value(&review).map_err(|e| ReviewError::DatabaseError(e.to_string()))?;
        self.store
            .insert(collections::REVIEWS, document)
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        self.store
            .update(
                collections::APPOINTMENTS,
                appointment.id,
                json!({ "is_reviewed": true }),
            )
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        self.push_review_id(review.doctor_id, review.id).await?;
        self.recompute_rating(review.doctor_id).await?;

        info!("Review {} created for doctor {}", review.id, review.doctor_id);
        Ok(review)
    }

    pub async fn get(&self, review_id: Uuid) -> Result<Review, ReviewError> {
        let document = self
            .store
            .get(collections::REVIEWS, review_id)
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?
            .ok_or(ReviewError::NotFound)?;
        parse_review(document)
    }

    /// Reviews for a doctor with reviewer names joined, newest first.
    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, ReviewError> {
        let documents = self
            .store
            .list(collections::REVIEWS, &Filter::new().eq("doctor_id", doctor_id))
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        let mut reviews = Vec::with_capacity(documents.len());
        for document in documents {
            let review = parse_review(document)?;
            let author = self
                .store
                .get(collections::PATIENTS, review.patient_id)
                .await
                .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

            let author_name = author
                .as_ref()
                .and_then(|patient| patient.get("name"))
                .and_then(Value::as_str)
                .map(String::from);
            let author_image_url = author
                .as_ref()
                .and_then(|patient| patient.get("image_url"))
                .and_then(Value::as_str)
                .map(String::from);

            reviews.push(ReviewWithAuthor {
                review,
                author_name,
                author_image_url,
            });
        }

        reviews.sort_by(|a, b| b.review.created_at.cmp(&a.review.created_at));
        Ok(reviews)
    }

    pub async fn edit(
        &self,
        review_id: Uuid,
        principal: &Principal,
        request: EditReviewRequest,
    ) -> Result<Review, ReviewError> {
        self.validate_content(&request.text, request.rating)?;

        let review = self.get(review_id).await?;
        if principal.patient_id() != Some(review.patient_id) {
            warn!(
                "Principal {} denied editing review {}",
                principal.id, review_id
            );
            return Err(ReviewError::Unauthorized);
        }

        let updated = self
            .store
            .update(
                collections::REVIEWS,
                review_id,
                json!({
                    "text": request.text,
                    "rating": request.rating,
                    "updated_at": Utc::now(),
                }),
            )
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;
        let updated = parse_review(updated)?;

        self.recompute_rating(updated.doctor_id).await?;
        Ok(updated)
    }

    /// Authors delete their own reviews; admin may delete any.
    pub async fn delete(&self, review_id: Uuid, principal: &Principal) -> Result<(), ReviewError> {
        let review = self.get(review_id).await?;

        let is_author = principal.patient_id() == Some(review.patient_id);
        if !is_author && !principal.is_admin() {
            warn!(
                "Principal {} denied deleting review {}",
                principal.id, review_id
            );
            return Err(ReviewError::Unauthorized);
        }

        let removed = self
            .store
            .delete(collections::REVIEWS, review_id)
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;
        if !removed {
            return Err(ReviewError::NotFound);
        }

        self.pull_review_id(review.doctor_id, review.id).await?;
        self.recompute_rating(review.doctor_id).await?;

        info!("Review {} deleted", review_id);
        Ok(())
    }

    /// Recompute `{count, average}` over all current reviews and write it
    /// back to the doctor record. Repeating this with an unchanged review
    /// set yields the identical aggregate.
    pub async fn recompute_rating(&self, doctor_id: Uuid) -> Result<RatingAggregate, ReviewError> {
        let documents = self
            .store
            .list(collections::REVIEWS, &Filter::new().eq("doctor_id", doctor_id))
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        let ratings: Vec<f64> = documents
            .iter()
            .filter_map(|document| document.get("rating").and_then(Value::as_f64))
            .collect();

        let count = ratings.len() as u64;
        let average = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        };

        match self
            .store
            .update(
                collections::DOCTORS,
                doctor_id,
                json!({
                    "average_rating": average,
                    "total_rating": count,
                }),
            )
            .await
        {
            Ok(_) => {}
            // The doctor may already be gone via the deletion cascade.
            Err(shared_store::StoreError::NotFound { .. }) => {
                debug!("Doctor {} missing during rating recompute", doctor_id);
            }
            Err(e) => return Err(ReviewError::DatabaseError(e.to_string())),
        }

        debug!(
            "Doctor {} rating aggregate: {} reviews, mean {:.2}",
            doctor_id, count, average
        );
        Ok(RatingAggregate { count, average })
    }

    async fn appointment(&self, appointment_id: Uuid) -> Result<Appointment, ReviewError> {
        let document = self
            .store
            .get(collections::APPOINTMENTS, appointment_id)
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?
            .ok_or(ReviewError::NotEligible)?;

        serde_json::from_value(document)
            .map_err(|e| ReviewError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    async fn push_review_id(&self, doctor_id: Uuid, review_id: Uuid) -> Result<(), ReviewError> {
        let doctor = self
            .doctors
            .get(doctor_id)
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        let mut review_ids = doctor.review_ids;
        review_ids.push(review_id);
        self.store
            .update(
                collections::DOCTORS,
                doctor_id,
                json!({ "review_ids": review_ids }),
            )
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn pull_review_id(&self, doctor_id: Uuid, review_id: Uuid) -> Result<(), ReviewError> {
        let doctor = match self.doctors.get(doctor_id).await {
            Ok(doctor) => doctor,
            // The doctor may already be gone via the deletion cascade.
            Err(_) => return Ok(()),
        };

        let review_ids: Vec<Uuid> = doctor
            .review_ids
            .into_iter()
            .filter(|id| *id != review_id)
            .collect();
        self.store
            .update(
                collections::DOCTORS,
                doctor_id,
                json!({ "review_ids": review_ids }),
            )
            .await
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn validate_content(&self, text: &str, rating: u8) -> Result<(), ReviewError> {
        if text.trim().is_empty() {
            return Err(ReviewError::ValidationError(
                "Review text is required".to_string(),
            ));
        }
        if text.len() > MAX_REVIEW_LENGTH {
            return Err(ReviewError::ValidationError(format!(
                "Review text must be {} characters or less",
                MAX_REVIEW_LENGTH
            )));
        }
        if rating > MAX_RATING {
            return Err(ReviewError::ValidationError(format!(
                "Rating must be between 0 and {}",
                MAX_RATING
            )));
        }
        Ok(())
    }
}

fn parse_review(document: Value) -> Result<Review, ReviewError> {
    serde_json::from_value(document)
        .map_err(|e| ReviewError::DatabaseError(format!("Failed to parse review: {}", e)))
}
