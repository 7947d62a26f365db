//! PostgreSQL adapter for ReviewRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{Category, NewReview, Review, ReviewId};
use crate::domain::ports::ReviewRepository;
use crate::entity::reviews;
use crate::error::DomainError;

/// PostgreSQL implementation of ReviewRepository
pub struct PostgresReviewRepository {
    db: DatabaseConnection,
}

impl PostgresReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map an update error, turning a missing row into `NotFound`
fn update_err(id: &ReviewId, e: DbErr) -> DomainError {
    match e {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => {
            DomainError::NotFound(format!("Review {} not found", id))
        }
        e => DomainError::Database(e.to_string()),
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn find_by_id(&self, id: &ReviewId) -> Result<Option<Review>, DomainError> {
        let result = reviews::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_random(&self) -> Result<Option<Review>, DomainError> {
        let result = reviews::Entity::find()
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list(&self) -> Result<Vec<Review>, DomainError> {
        let results = reviews::Entity::find()
            .order_by_desc(reviews::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, review: &NewReview) -> Result<Review, DomainError> {
        let model = reviews::ActiveModel {
            id: Set(Uuid::new_v4()),
            text: Set(review.text.clone()),
            votes_headphones: Set(review.votes_headphones),
            votes_wine: Set(review.votes_wine),
            created_at: Set(review.created_at.fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update_text(&self, id: &ReviewId, text: &str) -> Result<Review, DomainError> {
        let result = reviews::ActiveModel {
            id: Set(id.0),
            text: Set(text.to_string()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| update_err(id, e))?;

        Ok(result.into())
    }

    async fn delete(&self, id: &ReviewId) -> Result<bool, DomainError> {
        let result = reviews::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn add_vote(&self, id: &ReviewId, category: Category) -> Result<Review, DomainError> {
        let column = match category {
            Category::Headphones => reviews::Column::VotesHeadphones,
            Category::Wine => reviews::Column::VotesWine,
        };

        // Increment in SQL so concurrent votes never overwrite each other
        let result = reviews::Entity::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .filter(reviews::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Review {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Review {} not found", id)))
    }

    async fn set_votes(
        &self,
        id: &ReviewId,
        votes_headphones: i32,
        votes_wine: i32,
    ) -> Result<Review, DomainError> {
        let result = reviews::ActiveModel {
            id: Set(id.0),
            votes_headphones: Set(votes_headphones),
            votes_wine: Set(votes_wine),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| update_err(id, e))?;

        Ok(result.into())
    }

    async fn reset_all_votes(&self) -> Result<u64, DomainError> {
        let result = reviews::Entity::update_many()
            .col_expr(reviews::Column::VotesHeadphones, Expr::value(0))
            .col_expr(reviews::Column::VotesWine, Expr::value(0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

/// Convert SeaORM model to domain entity
impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Review {
            id: ReviewId(model.id),
            text: model.text,
            votes_headphones: model.votes_headphones,
            votes_wine: model.votes_wine,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
