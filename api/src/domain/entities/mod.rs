//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod pending_review;
pub mod rate_limit;
pub mod review;
pub mod user;

pub use pending_review::{ModerationStatus, NewPendingReview, PendingReview, PendingReviewId};
pub use rate_limit::{
    AttemptUpdate, DenyReason, RateLimitDecision, RateLimitId, RateLimitPolicy, RateLimitRecord,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_MINUTES, MAX_IP_LENGTH,
};
pub use review::{Category, NewReview, Review, ReviewId, VotePercentages, MAX_REVIEW_LENGTH};
pub use user::{NewUser, User, UserId};
