//! PostgreSQL adapter for PendingReviewRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    ModerationStatus, NewPendingReview, PendingReview, PendingReviewId, Review,
};
use crate::domain::ports::PendingReviewRepository;
use crate::entity::{pending_reviews, reviews};
use crate::error::DomainError;

/// PostgreSQL implementation of PendingReviewRepository
pub struct PostgresPendingReviewRepository {
    db: DatabaseConnection,
}

impl PostgresPendingReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lock a submission row and make sure it is still awaiting moderation
    async fn lock_pending(
        txn: &DatabaseTransaction,
        id: &PendingReviewId,
    ) -> Result<pending_reviews::Model, DomainError> {
        let model = pending_reviews::Entity::find_by_id(id.0)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Pending review {} not found", id)))?;

        let status: ModerationStatus = model
            .status
            .parse()
            .map_err(DomainError::Internal)?;
        if status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "Pending review {} is already {}",
                id, status
            )));
        }

        Ok(model)
    }
}

#[async_trait]
impl PendingReviewRepository for PostgresPendingReviewRepository {
    async fn find_by_id(
        &self,
        id: &PendingReviewId,
    ) -> Result<Option<PendingReview>, DomainError> {
        let result = pending_reviews::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(PendingReview::try_from).transpose()
    }

    async fn list_pending(&self) -> Result<Vec<PendingReview>, DomainError> {
        let results = pending_reviews::Entity::find()
            .filter(pending_reviews::Column::Status.eq(ModerationStatus::Pending.to_string()))
            .order_by_desc(pending_reviews::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(PendingReview::try_from).collect()
    }

    async fn create(&self, review: &NewPendingReview) -> Result<PendingReview, DomainError> {
        let model = pending_reviews::ActiveModel {
            id: Set(Uuid::new_v4()),
            text: Set(review.text.clone()),
            ip_address: Set(review.ip_address.clone()),
            status: Set(ModerationStatus::Pending.to_string()),
            created_at: Set(review.created_at.fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.try_into()
    }

    async fn approve(
        &self,
        id: &PendingReviewId,
        votes_headphones: i32,
        votes_wine: i32,
        now: DateTime<Utc>,
    ) -> Result<Review, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let pending = Self::lock_pending(&txn, id).await?;

        let review = reviews::ActiveModel {
            id: Set(Uuid::new_v4()),
            text: Set(pending.text.clone()),
            votes_headphones: Set(votes_headphones),
            votes_wine: Set(votes_wine),
            created_at: Set(now.fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        pending_reviews::ActiveModel {
            id: Set(pending.id),
            status: Set(ModerationStatus::Approved.to_string()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(review.into())
    }

    async fn reject(&self, id: &PendingReviewId) -> Result<PendingReview, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let pending = Self::lock_pending(&txn, id).await?;

        let result = pending_reviews::ActiveModel {
            id: Set(pending.id),
            status: Set(ModerationStatus::Rejected.to_string()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.try_into()
    }
}

/// Convert SeaORM model to domain entity.
///
/// A stored status this build does not know is an error, never a row that can
/// be moderated again.
impl TryFrom<pending_reviews::Model> for PendingReview {
    type Error = DomainError;

    fn try_from(model: pending_reviews::Model) -> Result<Self, Self::Error> {
        let status = model.status.parse().map_err(|e: String| {
            tracing::error!(
                pending_id = %model.id,
                status = %model.status,
                "Unknown moderation status"
            );
            DomainError::Internal(e)
        })?;

        Ok(PendingReview {
            id: PendingReviewId(model.id),
            text: model.text,
            ip_address: model.ip_address,
            status,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
