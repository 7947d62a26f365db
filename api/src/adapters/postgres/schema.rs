//! Table bootstrap
//!
//! Creates any missing table from the SeaORM entity definitions at startup.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::entity::{pending_reviews, rate_limits, reviews, users};

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(backend.build(&statement)).await?;
    tracing::debug!(table = entity.table_name(), "Table ensured");
    Ok(())
}

/// Create all application tables that do not exist yet
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, reviews::Entity).await?;
    create_table(db, pending_reviews::Entity).await?;
    create_table(db, rate_limits::Entity).await?;
    create_table(db, users::Entity).await?;
    Ok(())
}
