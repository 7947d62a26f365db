//! Moderation handlers
//!
//! Admins approve or reject queued public submissions.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{PendingReview, PendingReviewId, User};
use crate::error::AppError;
use crate::handlers::admin_reviews::ReviewResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PendingReviewResponse {
    pub id: String,
    pub text: String,
    pub ip_address: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<&PendingReview> for PendingReviewResponse {
    fn from(pending: &PendingReview) -> Self {
        Self {
            id: pending.id.to_string(),
            text: pending.text.clone(),
            ip_address: pending.ip_address.clone(),
            status: pending.status.to_string(),
            created_at: pending.created_at.to_rfc3339(),
        }
    }
}

/// GET /admin/pending-reviews
pub async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingReviewResponse>>, AppError> {
    let pending = state.review_service.list_pending().await?;
    Ok(Json(pending.iter().map(PendingReviewResponse::from).collect()))
}

/// POST /admin/pending-reviews/:id/approve
///
/// Publishes the submission as a new review. 409 if already decided.
pub async fn approve(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = state
        .review_service
        .approve_pending(&PendingReviewId(id))
        .await?;
    tracing::debug!(user_id = %admin.id, pending_id = %id, "Approval by admin");
    Ok(Json(ReviewResponse::from(&review)))
}

/// POST /admin/pending-reviews/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<PendingReviewResponse>, AppError> {
    let pending = state
        .review_service
        .reject_pending(&PendingReviewId(id))
        .await?;
    tracing::debug!(user_id = %admin.id, pending_id = %id, "Rejection by admin");
    Ok(Json(PendingReviewResponse::from(&pending)))
}
