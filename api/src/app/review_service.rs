//! Review service
//!
//! Game play (random review, voting), review administration and moderation of
//! public submissions.

use std::sync::Arc;

use rand::Rng;

use crate::app::game_config::{RESEED_VOTES_MAX, SEED_VOTES_MAX, SEED_VOTES_MIN};
use crate::domain::entities::{
    Category, NewPendingReview, NewReview, PendingReview, PendingReviewId, Review, ReviewId,
    MAX_REVIEW_LENGTH,
};
use crate::domain::ports::{Clock, PendingReviewRepository, ReviewRepository};
use crate::error::{AppError, DomainError};

/// Service for reviews and their moderation queue
pub struct ReviewService<RR, PR, C>
where
    RR: ReviewRepository,
    PR: PendingReviewRepository,
    C: Clock,
{
    reviews: Arc<RR>,
    pending: Arc<PR>,
    clock: Arc<C>,
}

impl<RR, PR, C> ReviewService<RR, PR, C>
where
    RR: ReviewRepository,
    PR: PendingReviewRepository,
    C: Clock,
{
    pub fn new(reviews: Arc<RR>, pending: Arc<PR>, clock: Arc<C>) -> Self {
        Self {
            reviews,
            pending,
            clock,
        }
    }

    /// Pick a random review to play, if any exist
    pub async fn random_review(&self) -> Result<Option<Review>, AppError> {
        Ok(self.reviews.find_random().await?)
    }

    /// Record one vote and return the updated review
    pub async fn vote(&self, id: &ReviewId, category: Category) -> Result<Review, AppError> {
        let review = self.reviews.add_vote(id, category).await?;
        tracing::debug!(review_id = %id, %category, "Vote recorded");
        Ok(review)
    }

    pub async fn get_review(&self, id: &ReviewId) -> Result<Review, AppError> {
        self.reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))
    }

    /// All reviews, newest first
    pub async fn list_reviews(&self) -> Result<Vec<Review>, AppError> {
        Ok(self.reviews.list().await?)
    }

    /// Publish a review directly (admin path) with seed votes
    pub async fn create_review(&self, text: &str) -> Result<Review, AppError> {
        let text = validate_review_text(text)?;
        let (votes_headphones, votes_wine) = seed_votes();

        let review = self
            .reviews
            .create(&NewReview {
                text,
                votes_headphones,
                votes_wine,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(review_id = %review.id, "Review created");
        Ok(review)
    }

    pub async fn update_review(&self, id: &ReviewId, text: &str) -> Result<Review, AppError> {
        let text = validate_review_text(text)?;
        Ok(self.reviews.update_text(id, &text).await?)
    }

    pub async fn delete_review(&self, id: &ReviewId) -> Result<(), AppError> {
        if !self.reviews.delete(id).await? {
            return Err(AppError::NotFound(format!("Review {} not found", id)));
        }
        tracing::info!(review_id = %id, "Review deleted");
        Ok(())
    }

    /// Zero the counters of one review
    pub async fn reset_votes(&self, id: &ReviewId) -> Result<Review, AppError> {
        Ok(self.reviews.set_votes(id, 0, 0).await?)
    }

    /// Zero the counters of every review
    pub async fn reset_all_votes(&self) -> Result<u64, AppError> {
        let count = self.reviews.reset_all_votes().await?;
        tracing::info!(count, "All votes reset");
        Ok(count)
    }

    /// Give every review fresh random counters in `0..=RESEED_VOTES_MAX`
    pub async fn seed_all_votes(&self) -> Result<u64, AppError> {
        let reviews = self.reviews.list().await?;
        let mut count = 0;

        for review in &reviews {
            let (votes_headphones, votes_wine) = {
                let mut rng = rand::thread_rng();
                (
                    rng.gen_range(0..=RESEED_VOTES_MAX),
                    rng.gen_range(0..=RESEED_VOTES_MAX),
                )
            };
            self.reviews
                .set_votes(&review.id, votes_headphones, votes_wine)
                .await?;
            count += 1;
        }

        tracing::info!(count, "Reviews re-seeded");
        Ok(count)
    }

    /// Queue a public submission for moderation
    pub async fn submit_pending(
        &self,
        text: &str,
        ip_address: Option<&str>,
    ) -> Result<PendingReview, AppError> {
        let text = validate_review_text(text)?;

        let pending = self
            .pending
            .create(&NewPendingReview {
                text,
                ip_address: ip_address.map(str::to_string),
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(pending_id = %pending.id, ip = ?ip_address, "Review submitted for moderation");
        Ok(pending)
    }

    /// Submissions awaiting moderation, newest first
    pub async fn list_pending(&self) -> Result<Vec<PendingReview>, AppError> {
        Ok(self.pending.list_pending().await?)
    }

    /// Approve a submission, publishing it as a review with seed votes
    pub async fn approve_pending(&self, id: &PendingReviewId) -> Result<Review, AppError> {
        let (votes_headphones, votes_wine) = seed_votes();
        let review = self
            .pending
            .approve(id, votes_headphones, votes_wine, self.clock.now())
            .await?;

        tracing::info!(pending_id = %id, review_id = %review.id, "Submission approved");
        Ok(review)
    }

    pub async fn reject_pending(&self, id: &PendingReviewId) -> Result<PendingReview, AppError> {
        let pending = self.pending.reject(id).await?;
        tracing::info!(pending_id = %id, "Submission rejected");
        Ok(pending)
    }
}

/// Trim and bound-check review text
pub fn validate_review_text(text: &str) -> Result<String, AppError> {
    let text = text.trim();

    if text.is_empty() {
        return Err(AppError::Domain(DomainError::Validation(
            "Review text is required".to_string(),
        )));
    }

    if text.chars().count() > MAX_REVIEW_LENGTH {
        return Err(AppError::Domain(DomainError::Validation(format!(
            "Review text must be at most {} characters",
            MAX_REVIEW_LENGTH
        ))));
    }

    Ok(text.to_string())
}

/// Random starting counters for a newly published review
fn seed_votes() -> (i32, i32) {
    let mut rng = rand::thread_rng();
    (
        rng.gen_range(SEED_VOTES_MIN..=SEED_VOTES_MAX),
        rng.gen_range(SEED_VOTES_MIN..=SEED_VOTES_MAX),
    )
}
