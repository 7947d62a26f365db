//! Rate limit service
//!
//! Admits or refuses anonymous write attempts per IP, and exposes the admin
//! operations for inspecting and clearing blocks.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::{
    RateLimitDecision, RateLimitPolicy, RateLimitRecord, MAX_IP_LENGTH,
};
use crate::domain::ports::{Clock, RateLimitRepository};
use crate::error::{AppError, DomainError};

pub struct RateLimitService<RL, C>
where
    RL: RateLimitRepository,
    C: Clock,
{
    repo: Arc<RL>,
    clock: Arc<C>,
    policy: RateLimitPolicy,
}

impl<RL, C> RateLimitService<RL, C>
where
    RL: RateLimitRepository,
    C: Clock,
{
    pub fn new(repo: Arc<RL>, clock: Arc<C>, policy: RateLimitPolicy) -> Self {
        Self {
            repo,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Record one attempt from `ip` at the current time
    pub async fn check(&self, ip: &str) -> Result<RateLimitDecision, AppError> {
        self.check_at(ip, self.clock.now()).await
    }

    /// Record one attempt from `ip` at an explicit time
    pub async fn check_at(
        &self,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, AppError> {
        Ok(self.repo.check_and_record(ip, now, &self.policy).await?)
    }

    /// Record one attempt and turn a denial into `TooManyAttempts`
    pub async fn admit(&self, ip: &str) -> Result<(), AppError> {
        match self.check(ip).await? {
            RateLimitDecision::Allowed { attempt_count } => {
                tracing::debug!(ip, attempt_count, "Attempt admitted");
                Ok(())
            }
            RateLimitDecision::Denied { reason } => {
                tracing::warn!(ip, %reason, "Attempt refused by rate limiter");
                Err(AppError::TooManyAttempts)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<RateLimitRecord>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, ip: &str) -> Result<RateLimitRecord, AppError> {
        self.repo
            .find_by_ip(ip)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No rate limit record for {}", ip)))
    }

    /// Block an IP, creating its record if needed
    pub async fn block(&self, ip: &str) -> Result<RateLimitRecord, AppError> {
        let ip = validate_ip(ip)?;
        let record = self.repo.block(ip, self.clock.now()).await?;
        tracing::info!(ip, "IP blocked by admin");
        Ok(record)
    }

    /// Clear the block and the counter for an IP
    pub async fn unblock(&self, ip: &str) -> Result<RateLimitRecord, AppError> {
        let record = self.repo.unblock(ip).await?;
        tracing::info!(ip, "IP unblocked by admin");
        Ok(record)
    }

    pub async fn delete(&self, ip: &str) -> Result<(), AppError> {
        if !self.repo.delete(ip).await? {
            return Err(AppError::NotFound(format!(
                "No rate limit record for {}",
                ip
            )));
        }
        tracing::info!(ip, "Rate limit record deleted");
        Ok(())
    }
}

/// Reject obviously malformed IP keys before they reach storage
fn validate_ip(ip: &str) -> Result<&str, AppError> {
    let ip = ip.trim();
    if ip.is_empty() || ip.len() > MAX_IP_LENGTH {
        return Err(AppError::Domain(DomainError::Validation(
            "Invalid IP address".to_string(),
        )));
    }
    Ok(ip)
}
