//! PostgreSQL adapter for RateLimitRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    AttemptUpdate, RateLimitDecision, RateLimitId, RateLimitPolicy, RateLimitRecord,
};
use crate::domain::ports::RateLimitRepository;
use crate::entity::rate_limits;
use crate::error::DomainError;

/// PostgreSQL implementation of RateLimitRepository
pub struct PostgresRateLimitRepository {
    db: DatabaseConnection,
}

impl PostgresRateLimitRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lock the record for an IP for the rest of the transaction
    async fn lock_record(
        txn: &DatabaseTransaction,
        ip: &str,
    ) -> Result<Option<rate_limits::Model>, DomainError> {
        rate_limits::Entity::find()
            .filter(rate_limits::Column::IpAddress.eq(ip))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    /// Insert the first record for an IP. Returns false when another
    /// transaction created the row first.
    async fn insert_first(
        txn: &DatabaseTransaction,
        ip: &str,
        update: &AttemptUpdate,
    ) -> Result<bool, DomainError> {
        let at = update.last_attempt.fixed_offset();

        let model = rate_limits::ActiveModel {
            id: Set(Uuid::new_v4()),
            ip_address: Set(ip.to_string()),
            attempt_count: Set(update.attempt_count),
            last_attempt: Set(at),
            is_blocked: Set(update.is_blocked),
            created_at: Set(at),
        };

        let inserted = rate_limits::Entity::insert(model)
            .on_conflict(
                OnConflict::column(rate_limits::Column::IpAddress)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Evaluate one attempt against a locked, existing record and persist it
    async fn record_attempt(
        txn: &DatabaseTransaction,
        model: rate_limits::Model,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, DomainError> {
        let id = model.id;
        let current: RateLimitRecord = model.into();
        let outcome = policy.evaluate(Some(&current), now);

        if let Some(update) = outcome.update {
            rate_limits::ActiveModel {
                id: Set(id),
                attempt_count: Set(update.attempt_count),
                last_attempt: Set(update.last_attempt.fixed_offset()),
                is_blocked: Set(update.is_blocked),
                ..Default::default()
            }
            .update(txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
        }

        Ok(outcome.decision)
    }
}

#[async_trait]
impl RateLimitRepository for PostgresRateLimitRepository {
    async fn find_by_ip(&self, ip: &str) -> Result<Option<RateLimitRecord>, DomainError> {
        let result = rate_limits::Entity::find()
            .filter(rate_limits::Column::IpAddress.eq(ip))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn check_and_record(
        &self,
        ip: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        // Row lock serializes concurrent attempts from the same IP
        let decision = match Self::lock_record(&txn, ip).await? {
            Some(model) => Self::record_attempt(&txn, model, now, policy).await?,
            None => {
                let outcome = policy.evaluate(None, now);
                let inserted = match &outcome.update {
                    Some(update) => Self::insert_first(&txn, ip, update).await?,
                    None => false,
                };

                if inserted {
                    outcome.decision
                } else {
                    // Lost the race for the first row: count against the winner's record
                    let model = Self::lock_record(&txn, ip).await?.ok_or_else(|| {
                        DomainError::Internal(format!("Rate limit for {} vanished", ip))
                    })?;
                    Self::record_attempt(&txn, model, now, policy).await?
                }
            }
        };

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(decision)
    }

    async fn block(&self, ip: &str, now: DateTime<Utc>) -> Result<RateLimitRecord, DomainError> {
        let at = now.fixed_offset();

        let model = rate_limits::ActiveModel {
            id: Set(Uuid::new_v4()),
            ip_address: Set(ip.to_string()),
            attempt_count: Set(0),
            last_attempt: Set(at),
            is_blocked: Set(true),
            created_at: Set(at),
        };

        rate_limits::Entity::insert(model)
            .on_conflict(
                OnConflict::column(rate_limits::Column::IpAddress)
                    .update_column(rate_limits::Column::IsBlocked)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.find_by_ip(ip)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("Rate limit for {} vanished", ip)))
    }

    async fn unblock(&self, ip: &str) -> Result<RateLimitRecord, DomainError> {
        let existing = rate_limits::Entity::find()
            .filter(rate_limits::Column::IpAddress.eq(ip))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("No rate limit record for {}", ip)))?;

        let result = rate_limits::ActiveModel {
            id: Set(existing.id),
            attempt_count: Set(0),
            is_blocked: Set(false),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, ip: &str) -> Result<bool, DomainError> {
        let result = rate_limits::Entity::delete_many()
            .filter(rate_limits::Column::IpAddress.eq(ip))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn list(&self) -> Result<Vec<RateLimitRecord>, DomainError> {
        let results = rate_limits::Entity::find()
            .order_by_desc(rate_limits::Column::LastAttempt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<rate_limits::Model> for RateLimitRecord {
    fn from(model: rate_limits::Model) -> Self {
        RateLimitRecord {
            id: RateLimitId(model.id),
            ip_address: model.ip_address,
            attempt_count: model.attempt_count,
            last_attempt: model.last_attempt.with_timezone(&Utc),
            is_blocked: model.is_blocked,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
