//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Why manual mocks instead of mockall?
//! - The rate limit mock has to apply the real policy atomically, like the
//!   Postgres adapter does under a row lock
//! - Approvals must publish into a review repository the test can inspect
//! - We control exactly what they return without macro magic

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
