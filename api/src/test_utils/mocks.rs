//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::entities::{
    Category, ModerationStatus, NewPendingReview, NewReview, NewUser, PendingReview,
    PendingReviewId, RateLimitDecision, RateLimitId, RateLimitPolicy, RateLimitRecord, Review,
    ReviewId, User, UserId,
};
use crate::domain::ports::{
    Clock, PendingReviewRepository, RateLimitRepository, ReviewRepository, UserRepository,
};
use crate::error::DomainError;

// ============================================================================
// Fixed Clock
// ============================================================================

/// Clock that only moves when told to
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// In-Memory Review Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryReviewRepository {
    reviews: Arc<RwLock<HashMap<ReviewId, Review>>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a review for testing
    pub fn with_review(self, review: Review) -> Self {
        self.reviews.write().unwrap().insert(review.id, review);
        self
    }

    fn insert(&self, new_review: &NewReview) -> Review {
        let review = Review {
            id: ReviewId::new(),
            text: new_review.text.clone(),
            votes_headphones: new_review.votes_headphones,
            votes_wine: new_review.votes_wine,
            created_at: new_review.created_at,
        };
        self.reviews
            .write()
            .unwrap()
            .insert(review.id, review.clone());
        review
    }

    fn modify(
        &self,
        id: &ReviewId,
        f: impl FnOnce(&mut Review),
    ) -> Result<Review, DomainError> {
        let mut reviews = self.reviews.write().unwrap();
        let review = reviews
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Review {}", id)))?;
        f(review);
        Ok(review.clone())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, DomainError> {
        Ok(self.reviews.read().unwrap().get(id).cloned())
    }

    async fn find_random(&self) -> Result<Option<Review>, DomainError> {
        let reviews = self.reviews.read().unwrap();
        let all: Vec<&Review> = reviews.values().collect();
        Ok(all.choose(&mut rand::thread_rng()).map(|r| (*r).clone()))
    }

    async fn list(&self) -> Result<Vec<Review>, DomainError> {
        let mut reviews: Vec<Review> = self.reviews.read().unwrap().values().cloned().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn create(&self, review: &NewReview) -> Result<Review, DomainError> {
        Ok(self.insert(review))
    }

    async fn update_text(&self, id: &ReviewId, text: &str) -> Result<Review, DomainError> {
        self.modify(id, |r| r.text = text.to_string())
    }

    async fn delete(&self, id: &ReviewId) -> Result<bool, DomainError> {
        Ok(self.reviews.write().unwrap().remove(id).is_some())
    }

    async fn add_vote(&self, id: &ReviewId, category: Category) -> Result<Review, DomainError> {
        self.modify(id, |r| match category {
            Category::Headphones => r.votes_headphones += 1,
            Category::Wine => r.votes_wine += 1,
        })
    }

    async fn set_votes(
        &self,
        id: &ReviewId,
        votes_headphones: i32,
        votes_wine: i32,
    ) -> Result<Review, DomainError> {
        self.modify(id, |r| {
            r.votes_headphones = votes_headphones;
            r.votes_wine = votes_wine;
        })
    }

    async fn reset_all_votes(&self) -> Result<u64, DomainError> {
        let mut reviews = self.reviews.write().unwrap();
        for review in reviews.values_mut() {
            review.votes_headphones = 0;
            review.votes_wine = 0;
        }
        Ok(reviews.len() as u64)
    }
}

// ============================================================================
// In-Memory Pending Review Repository
// ============================================================================

pub struct InMemoryPendingReviewRepository {
    pending: Arc<RwLock<HashMap<PendingReviewId, PendingReview>>>,
    /// Approved submissions are published here
    reviews: Arc<InMemoryReviewRepository>,
}

impl Default for InMemoryPendingReviewRepository {
    fn default() -> Self {
        Self::with_reviews(Arc::new(InMemoryReviewRepository::new()))
    }
}

impl InMemoryPendingReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a review repository so approvals are visible through it
    pub fn with_reviews(reviews: Arc<InMemoryReviewRepository>) -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
            reviews,
        }
    }

    /// Pre-populate with a submission for testing
    pub fn with_pending(self, pending: PendingReview) -> Self {
        self.pending.write().unwrap().insert(pending.id, pending);
        self
    }

    /// Move a pending submission to a terminal status
    fn decide(
        pending: &mut HashMap<PendingReviewId, PendingReview>,
        id: &PendingReviewId,
        status: ModerationStatus,
    ) -> Result<PendingReview, DomainError> {
        let entry = pending
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Pending review {}", id)))?;
        if entry.status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "Pending review {} is already {}",
                id, entry.status
            )));
        }
        entry.status = status;
        Ok(entry.clone())
    }
}

#[async_trait]
impl PendingReviewRepository for InMemoryPendingReviewRepository {
    async fn find_by_id(
        &self,
        id: &PendingReviewId,
    ) -> Result<Option<PendingReview>, DomainError> {
        Ok(self.pending.read().unwrap().get(id).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<PendingReview>, DomainError> {
        let mut pending: Vec<PendingReview> = self
            .pending
            .read()
            .unwrap()
            .values()
            .filter(|p| p.status == ModerationStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn create(&self, review: &NewPendingReview) -> Result<PendingReview, DomainError> {
        let pending = PendingReview {
            id: PendingReviewId::new(),
            text: review.text.clone(),
            ip_address: review.ip_address.clone(),
            status: ModerationStatus::Pending,
            created_at: review.created_at,
        };
        self.pending
            .write()
            .unwrap()
            .insert(pending.id, pending.clone());
        Ok(pending)
    }

    async fn approve(
        &self,
        id: &PendingReviewId,
        votes_headphones: i32,
        votes_wine: i32,
        now: DateTime<Utc>,
    ) -> Result<Review, DomainError> {
        let mut pending = self.pending.write().unwrap();
        let approved = Self::decide(&mut pending, id, ModerationStatus::Approved)?;
        Ok(self.reviews.insert(&NewReview {
            text: approved.text,
            votes_headphones,
            votes_wine,
            created_at: now,
        }))
    }

    async fn reject(&self, id: &PendingReviewId) -> Result<PendingReview, DomainError> {
        let mut pending = self.pending.write().unwrap();
        Self::decide(&mut pending, id, ModerationStatus::Rejected)
    }
}

// ============================================================================
// In-Memory Rate Limit Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    records: Arc<RwLock<HashMap<String, RateLimitRecord>>>,
}

impl InMemoryRateLimitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a record for testing
    pub fn with_record(self, record: RateLimitRecord) -> Self {
        self.records
            .write()
            .unwrap()
            .insert(record.ip_address.clone(), record);
        self
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn find_by_ip(&self, ip: &str) -> Result<Option<RateLimitRecord>, DomainError> {
        Ok(self.records.read().unwrap().get(ip).cloned())
    }

    async fn check_and_record(
        &self,
        ip: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, DomainError> {
        // Single write lock plays the role of the row lock
        let mut records = self.records.write().unwrap();
        let outcome = policy.evaluate(records.get(ip), now);

        if let Some(update) = outcome.update {
            match records.get_mut(ip) {
                Some(record) => record.apply(&update),
                None => {
                    records.insert(ip.to_string(), RateLimitRecord::first(ip, &update));
                }
            }
        }

        Ok(outcome.decision)
    }

    async fn block(&self, ip: &str, now: DateTime<Utc>) -> Result<RateLimitRecord, DomainError> {
        let mut records = self.records.write().unwrap();
        let record = records
            .entry(ip.to_string())
            .or_insert_with(|| RateLimitRecord {
                id: RateLimitId::new(),
                ip_address: ip.to_string(),
                attempt_count: 0,
                last_attempt: now,
                is_blocked: true,
                created_at: now,
            });
        record.is_blocked = true;
        Ok(record.clone())
    }

    async fn unblock(&self, ip: &str) -> Result<RateLimitRecord, DomainError> {
        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(ip)
            .ok_or_else(|| DomainError::NotFound(format!("Rate limit record for {}", ip)))?;
        record.is_blocked = false;
        record.attempt_count = 0;
        Ok(record.clone())
    }

    async fn delete(&self, ip: &str) -> Result<bool, DomainError> {
        Ok(self.records.write().unwrap().remove(ip).is_some())
    }

    async fn list(&self) -> Result<Vec<RateLimitRecord>, DomainError> {
        let mut records: Vec<RateLimitRecord> =
            self.records.read().unwrap().values().cloned().collect();
        records.sort_by(|a, b| b.last_attempt.cmp(&a.last_attempt));
        Ok(records)
    }
}

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.username == new_user.username) {
            return Err(DomainError::AlreadyExists(format!(
                "User {}",
                new_user.username
            )));
        }

        let user = User {
            id: UserId::new(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            is_admin: new_user.is_admin,
            created_at: new_user.created_at,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, id: &UserId, hash: &str) -> Result<(), DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))?;
        user.password_hash = hash.to_string();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let mut users: Vec<User> = self.users.read().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
