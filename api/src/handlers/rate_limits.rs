//! Rate limit administration handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::domain::entities::RateLimitRecord;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RateLimitResponse {
    pub ip_address: String,
    pub attempt_count: i32,
    pub last_attempt: String,
    pub is_blocked: bool,
    pub created_at: String,
}

impl From<&RateLimitRecord> for RateLimitResponse {
    fn from(record: &RateLimitRecord) -> Self {
        Self {
            ip_address: record.ip_address.clone(),
            attempt_count: record.attempt_count,
            last_attempt: record.last_attempt.to_rfc3339(),
            is_blocked: record.is_blocked,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RateLimitListResponse {
    pub window_minutes: i64,
    pub max_attempts: i32,
    pub records: Vec<RateLimitResponse>,
}

/// GET /admin/rate-limits
///
/// All records, most recent attempt first, with the active policy.
pub async fn list_rate_limits(
    State(state): State<AppState>,
) -> Result<Json<RateLimitListResponse>, AppError> {
    let records = state.rate_limit_service.list().await?;
    let policy = state.rate_limit_service.policy();

    Ok(Json(RateLimitListResponse {
        window_minutes: policy.window.num_minutes(),
        max_attempts: policy.max_attempts,
        records: records.iter().map(RateLimitResponse::from).collect(),
    }))
}

/// POST /admin/rate-limits/:ip/block
pub async fn block_ip(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<RateLimitResponse>, AppError> {
    let record = state.rate_limit_service.block(&ip).await?;
    Ok(Json(RateLimitResponse::from(&record)))
}

/// POST /admin/rate-limits/:ip/unblock
pub async fn unblock_ip(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<RateLimitResponse>, AppError> {
    let record = state.rate_limit_service.unblock(&ip).await?;
    Ok(Json(RateLimitResponse::from(&record)))
}

/// DELETE /admin/rate-limits/:ip
pub async fn delete_rate_limit(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<StatusCode, AppError> {
    state.rate_limit_service.delete(&ip).await?;
    Ok(StatusCode::NO_CONTENT)
}
