//! Game handlers
//!
//! Public endpoints for playing: fetch a random review and vote on it.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Category, Review, ReviewId, VotePercentages};
use crate::error::AppError;
use crate::AppState;

/// A review as shown to players. Raw counters stay hidden until after the vote.
#[derive(Debug, Serialize)]
pub struct PlayReview {
    pub id: String,
    pub text: String,
}

impl From<&Review> for PlayReview {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.to_string(),
            text: review.text.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub review: Option<PlayReview>,
    #[serde(flatten)]
    pub percentages: VotePercentages,
    pub has_voted: bool,
}

/// GET /play
///
/// Pick a random review. When there are no reviews `review` is null and both
/// percentages are 0.
pub async fn play(State(state): State<AppState>) -> Result<Json<PlayResponse>, AppError> {
    let review = state.review_service.random_review().await?;

    let percentages = review
        .as_ref()
        .map(Review::percentages)
        .unwrap_or_else(|| VotePercentages::from_counts(0, 0));

    Ok(Json(PlayResponse {
        review: review.as_ref().map(PlayReview::from),
        percentages,
        has_voted: false,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub review_id: Uuid,
    /// `headphones` or `wine`
    pub vote_type: String,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    #[serde(flatten)]
    pub percentages: VotePercentages,
    pub total_votes: i64,
}

/// POST /vote
///
/// Add one vote and return the new split.
pub async fn vote(
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    let category: Category = request.vote_type.parse().map_err(AppError::BadRequest)?;

    let review = state
        .review_service
        .vote(&ReviewId(request.review_id), category)
        .await?;

    Ok(Json(VoteResponse {
        percentages: review.percentages(),
        total_votes: review.total_votes(),
    }))
}
