//! Rate limit domain entity
//!
//! Per-IP attempt counters for anonymous write actions, plus the sliding-window
//! policy that decides whether the next attempt is admitted.
//!
//! States per IP:
//! - Fresh: no record exists
//! - Active: attempts below the maximum inside the current window
//! - Blocked: the maximum was reached or an admin blocked the IP
//!
//! A block is sticky. Elapsed time never clears it; only an admin unblock or
//! deleting the record does.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default length of the attempt window
pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

/// Default number of attempts that triggers a block
pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Longest stored IP key (textual IPv6 with an embedded IPv4 tail)
pub const MAX_IP_LENGTH: usize = 45;

/// Unique identifier for a rate limit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitId(pub Uuid);

impl RateLimitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RateLimitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Persisted attempt counter for one IP address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitRecord {
    pub id: RateLimitId,
    pub ip_address: String,
    pub attempt_count: i32,
    pub last_attempt: DateTime<Utc>,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

/// Why an attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The record was already blocked before this attempt
    Blocked,
    /// This attempt reached the maximum and blocked the record
    LimitReached,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::Blocked => write!(f, "blocked"),
            DenyReason::LimitReached => write!(f, "limit reached"),
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { attempt_count: i32 },
    Denied { reason: DenyReason },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// New counter values to persist after a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptUpdate {
    pub attempt_count: i32,
    pub last_attempt: DateTime<Utc>,
    pub is_blocked: bool,
}

/// What a check decided and what, if anything, must be written back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub decision: RateLimitDecision,
    /// `None` when the record must stay untouched
    pub update: Option<AttemptUpdate>,
}

/// Sliding-window admission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_attempts: i32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(DEFAULT_WINDOW_MINUTES),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RateLimitPolicy {
    pub fn new(window: Duration, max_attempts: i32) -> Self {
        Self {
            window,
            max_attempts,
        }
    }

    /// Decide on one attempt made at `now` against the current record.
    ///
    /// Pure: the caller persists `outcome.update` inside the same transaction
    /// that read `record`.
    pub fn evaluate(&self, record: Option<&RateLimitRecord>, now: DateTime<Utc>) -> RateLimitOutcome {
        let Some(record) = record else {
            return RateLimitOutcome {
                decision: RateLimitDecision::Allowed { attempt_count: 1 },
                update: Some(AttemptUpdate {
                    attempt_count: 1,
                    last_attempt: now,
                    is_blocked: false,
                }),
            };
        };

        if record.is_blocked {
            return RateLimitOutcome {
                decision: RateLimitDecision::Denied {
                    reason: DenyReason::Blocked,
                },
                update: None,
            };
        }

        if now - record.last_attempt >= self.window {
            return RateLimitOutcome {
                decision: RateLimitDecision::Allowed { attempt_count: 1 },
                update: Some(AttemptUpdate {
                    attempt_count: 1,
                    last_attempt: now,
                    is_blocked: false,
                }),
            };
        }

        let attempt_count = record.attempt_count.saturating_add(1);
        let is_blocked = attempt_count >= self.max_attempts;
        let decision = if is_blocked {
            RateLimitDecision::Denied {
                reason: DenyReason::LimitReached,
            }
        } else {
            RateLimitDecision::Allowed { attempt_count }
        };

        RateLimitOutcome {
            decision,
            update: Some(AttemptUpdate {
                attempt_count,
                last_attempt: now,
                is_blocked,
            }),
        }
    }
}

/// In-memory replay of policy updates, for the test repositories
#[cfg(test)]
impl RateLimitRecord {
    /// Build the first record for an IP from a policy update
    pub fn first(ip_address: &str, update: &AttemptUpdate) -> Self {
        Self {
            id: RateLimitId::new(),
            ip_address: ip_address.to_string(),
            attempt_count: update.attempt_count,
            last_attempt: update.last_attempt,
            is_blocked: update.is_blocked,
            created_at: update.last_attempt,
        }
    }

    pub fn apply(&mut self, update: &AttemptUpdate) {
        self.attempt_count = update.attempt_count;
        self.last_attempt = update.last_attempt;
        self.is_blocked = update.is_blocked;
    }
}
