//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod pending_review_repo;
pub mod rate_limit_repo;
pub mod review_repo;
pub mod schema;
pub mod user_repo;


pub use pending_review_repo::PostgresPendingReviewRepository;
pub use rate_limit_repo::PostgresRateLimitRepository;
pub use review_repo::PostgresReviewRepository;
pub use schema::ensure_schema;
pub use user_repo::PostgresUserRepository;
