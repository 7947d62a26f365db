//! Domain layer
//!
//! Pure game and moderation logic with no I/O.
//! - `entities`: Reviews, submissions, users and the rate limit policy
//! - `ports`: Traits for persistence and time

pub mod entities;
pub mod ports;
