//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{
    Category, NewPendingReview, NewReview, NewUser, PendingReview, PendingReviewId,
    RateLimitDecision, RateLimitPolicy, RateLimitRecord, Review, ReviewId, User, UserId,
};
use crate::error::DomainError;

/// Repository for Review entities
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Find a review by ID
    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, DomainError>;

    /// Pick one review uniformly at random
    async fn find_random(&self) -> Result<Option<Review>, DomainError>;

    /// List all reviews, newest first
    async fn list(&self) -> Result<Vec<Review>, DomainError>;

    /// Create a new review
    async fn create(&self, review: &NewReview) -> Result<Review, DomainError>;

    /// Replace the text of a review
    async fn update_text(&self, id: &ReviewId, text: &str) -> Result<Review, DomainError>;

    /// Delete a review. Returns false if it did not exist.
    async fn delete(&self, id: &ReviewId) -> Result<bool, DomainError>;

    /// Atomically add one vote to a category
    async fn add_vote(&self, id: &ReviewId, category: Category) -> Result<Review, DomainError>;

    /// Overwrite both vote counters of one review
    async fn set_votes(
        &self,
        id: &ReviewId,
        votes_headphones: i32,
        votes_wine: i32,
    ) -> Result<Review, DomainError>;

    /// Zero the counters of every review. Returns the number of reviews touched.
    async fn reset_all_votes(&self) -> Result<u64, DomainError>;
}

/// Repository for PendingReview entities
#[async_trait]
pub trait PendingReviewRepository: Send + Sync {
    /// Find a pending review by ID (any status)
    async fn find_by_id(&self, id: &PendingReviewId)
        -> Result<Option<PendingReview>, DomainError>;

    /// List submissions still awaiting moderation, newest first
    async fn list_pending(&self) -> Result<Vec<PendingReview>, DomainError>;

    /// Create a new pending review
    async fn create(&self, review: &NewPendingReview) -> Result<PendingReview, DomainError>;

    /// Mark a pending submission approved and publish it as a review created
    /// at `now`.
    ///
    /// Both writes happen atomically. Fails with `Conflict` if the submission
    /// is no longer pending.
    async fn approve(
        &self,
        id: &PendingReviewId,
        votes_headphones: i32,
        votes_wine: i32,
        now: DateTime<Utc>,
    ) -> Result<Review, DomainError>;

    /// Mark a pending submission rejected. Fails with `Conflict` if it is no
    /// longer pending.
    async fn reject(&self, id: &PendingReviewId) -> Result<PendingReview, DomainError>;
}

/// Repository for RateLimit records, keyed by IP address
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Find the record for an IP
    async fn find_by_ip(&self, ip: &str) -> Result<Option<RateLimitRecord>, DomainError>;

    /// Evaluate one attempt against `policy` and persist the result.
    ///
    /// The read and the write form one atomic unit per IP so concurrent
    /// attempts cannot lose increments.
    async fn check_and_record(
        &self,
        ip: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, DomainError>;

    /// Force an IP into the blocked state, creating its record if needed
    async fn block(&self, ip: &str, now: DateTime<Utc>) -> Result<RateLimitRecord, DomainError>;

    /// Clear the block and the attempt counter. Fails with `NotFound` if the
    /// IP has no record.
    async fn unblock(&self, ip: &str) -> Result<RateLimitRecord, DomainError>;

    /// Delete the record for an IP. Returns false if it did not exist.
    async fn delete(&self, ip: &str) -> Result<bool, DomainError>;

    /// List all records, most recent attempt first
    async fn list(&self) -> Result<Vec<RateLimitRecord>, DomainError>;
}

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Replace a user's password hash
    async fn update_password_hash(&self, id: &UserId, hash: &str) -> Result<(), DomainError>;

    /// List all users
    async fn list(&self) -> Result<Vec<User>, DomainError>;
}
