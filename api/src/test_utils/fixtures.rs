//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;

use crate::app::user_service::hash_password;
use crate::domain::entities::{
    ModerationStatus, PendingReview, PendingReviewId, RateLimitId, RateLimitRecord, Review,
    ReviewId, User, UserId,
};

/// Create a test review with a few votes
pub fn test_review() -> Review {
    test_review_with_votes(12, 15)
}

/// Create a test review with specific vote counters
pub fn test_review_with_votes(votes_headphones: i32, votes_wine: i32) -> Review {
    Review {
        id: ReviewId::new(),
        text: "Tight bass and a long, oaky finish.".to_string(),
        votes_headphones,
        votes_wine,
        created_at: Utc::now(),
    }
}

/// Create a submission awaiting moderation
pub fn test_pending_review() -> PendingReview {
    PendingReview {
        id: PendingReviewId::new(),
        text: "Opens up after an hour of burn-in.".to_string(),
        ip_address: Some("203.0.113.5".to_string()),
        status: ModerationStatus::Pending,
        created_at: Utc::now(),
    }
}

/// Create an admin with a real Argon2 hash of `password`
pub fn test_admin(username: &str, password: &str) -> User {
    User {
        id: UserId::new(),
        username: username.to_string(),
        password_hash: hash_password(password).unwrap(),
        is_admin: true,
        created_at: Utc::now(),
    }
}

/// Create a non-admin user
pub fn test_user(username: &str, password: &str) -> User {
    User {
        is_admin: false,
        ..test_admin(username, password)
    }
}

/// Create a rate limit record last touched now
pub fn test_rate_limit_record(ip: &str, attempt_count: i32, is_blocked: bool) -> RateLimitRecord {
    let now = Utc::now();
    RateLimitRecord {
        id: RateLimitId::new(),
        ip_address: ip.to_string(),
        attempt_count,
        last_attempt: now,
        is_blocked,
        created_at: now,
    }
}
