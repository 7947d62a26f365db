//! Submission handlers
//!
//! CAPTCHA issuance and review submission. Anonymous submissions are rate
//! limited per client IP, CAPTCHA-gated and queued for moderation. Admins
//! publish directly.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::app::review_service::validate_review_text;
use crate::domain::entities::{User, MAX_IP_LENGTH};
use crate::error::AppError;
use crate::handlers::admin_reviews::ReviewResponse;
use crate::AppState;

/// Key used when the peer address is unavailable
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Serialize)]
pub struct CaptchaResponse {
    /// Base64-encoded PNG
    pub captcha_image: String,
    /// Opaque token to send back with the answer
    pub captcha_token: String,
}

/// GET /captcha, POST /captcha/refresh
pub async fn captcha(State(state): State<AppState>) -> Result<Json<CaptchaResponse>, AppError> {
    let captcha = state.captcha_service.generate()?;

    Ok(Json(CaptchaResponse {
        captcha_image: captcha.image_png_base64,
        captcha_token: captcha.token,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub review_text: String,
    #[serde(default)]
    pub captcha_answer: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PendingSubmissionResponse {
    pub id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SubmitReviewResponse {
    Published(ReviewResponse),
    Pending(PendingSubmissionResponse),
}

/// Work out the client IP used as the rate limit key.
///
/// The first `X-Forwarded-For` entry wins only when the deployment says a
/// trusted proxy sets it. It is cut to `MAX_IP_LENGTH` characters so it
/// always fits the rate limit key column.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.chars().take(MAX_IP_LENGTH).collect();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// POST /submit-review
///
/// Admins (valid bearer token) publish immediately with seed votes: 201.
/// Everyone else passes the rate limiter, text validation and the CAPTCHA
/// in that order, then lands in the moderation queue: 202.
pub async fn submit_review(
    State(state): State<AppState>,
    admin: Option<Extension<User>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<SubmitReviewResponse>), AppError> {
    if let Some(Extension(admin)) = admin {
        let review = state.review_service.create_review(&request.review_text).await?;
        tracing::info!(user_id = %admin.id, review_id = %review.id, "Admin published review");
        return Ok((
            StatusCode::CREATED,
            Json(SubmitReviewResponse::Published(ReviewResponse::from(&review))),
        ));
    }

    let ip = client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.trust_forwarded_for,
    );

    state.rate_limit_service.admit(&ip).await?;

    let text = validate_review_text(&request.review_text)?;

    if !state.captcha_service.verify(
        request.captcha_token.as_deref(),
        request.captcha_answer.as_deref(),
    ) {
        tracing::debug!(%ip, "CAPTCHA check failed");
        return Err(AppError::BadRequest("Invalid captcha answer".to_string()));
    }

    let pending = state.review_service.submit_pending(&text, Some(&ip)).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitReviewResponse::Pending(PendingSubmissionResponse {
            id: pending.id.to_string(),
            status: pending.status.to_string(),
            message: "Review submitted for moderation".to_string(),
        })),
    ))
}
