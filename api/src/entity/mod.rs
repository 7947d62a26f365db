//! SeaORM entities
//!
//! Table models used by the PostgreSQL adapters. Domain code never sees these
//! directly; adapters convert them with `From` impls.

pub mod pending_reviews;
pub mod rate_limits;
pub mod reviews;
pub mod users;
