//! Review administration handlers
//!
//! CRUD over published reviews plus vote resets and re-seeding. All routes
//! require an admin session.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Review, ReviewId};
use crate::error::AppError;
use crate::AppState;

/// A review with its raw counters, as admins see it
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub text: String,
    pub votes_headphones: i32,
    pub votes_wine: i32,
    pub headphones_percentage: i32,
    pub wine_percentage: i32,
    pub created_at: String,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        let percentages = review.percentages();
        Self {
            id: review.id.to_string(),
            text: review.text.clone(),
            votes_headphones: review.votes_headphones,
            votes_wine: review.votes_wine,
            headphones_percentage: percentages.headphones_percentage,
            wine_percentage: percentages.wine_percentage,
            created_at: review.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub updated: u64,
}

/// GET /admin/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let reviews = state.review_service.list_reviews().await?;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}

/// GET /admin/reviews/:id
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = state.review_service.get_review(&ReviewId(id)).await?;
    Ok(Json(ReviewResponse::from(&review)))
}

/// POST /admin/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewTextRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let review = state.review_service.create_review(&request.text).await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(&review))))
}

/// PUT /admin/reviews/:id
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewTextRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = state
        .review_service
        .update_review(&ReviewId(id), &request.text)
        .await?;
    Ok(Json(ReviewResponse::from(&review)))
}

/// DELETE /admin/reviews/:id
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.review_service.delete_review(&ReviewId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/reviews/:id/reset-votes
pub async fn reset_votes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = state.review_service.reset_votes(&ReviewId(id)).await?;
    Ok(Json(ReviewResponse::from(&review)))
}

/// POST /admin/reviews/reset-all-votes
pub async fn reset_all_votes(
    State(state): State<AppState>,
) -> Result<Json<BulkUpdateResponse>, AppError> {
    let updated = state.review_service.reset_all_votes().await?;
    Ok(Json(BulkUpdateResponse { updated }))
}

/// POST /admin/reviews/seed-votes
pub async fn seed_all_votes(
    State(state): State<AppState>,
) -> Result<Json<BulkUpdateResponse>, AppError> {
    let updated = state.review_service.seed_all_votes().await?;
    Ok(Json(BulkUpdateResponse { updated }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_review_with_votes;

    #[test]
    fn review_response_includes_percentages() {
        let review = test_review_with_votes(1, 7);

        let response = ReviewResponse::from(&review);

        assert_eq!(response.votes_headphones, 1);
        assert_eq!(response.votes_wine, 7);
        assert_eq!(response.headphones_percentage, 13);
        assert_eq!(response.wine_percentage, 87);
    }

    #[test]
    fn parse_review_text_request() {
        let request: ReviewTextRequest =
            serde_json::from_str(r#"{"text": "Bright acidity"}"#).unwrap();
        assert_eq!(request.text, "Bright acidity");
    }

    #[test]
    fn parse_review_text_request_missing_text() {
        assert!(serde_json::from_str::<ReviewTextRequest>("{}").is_err());
    }
}
