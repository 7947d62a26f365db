//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod admin_reviews;
pub mod admin_users;
pub mod game;
pub mod moderation;
pub mod rate_limits;
pub mod submit;

pub use admin_reviews::{
    create_review, delete_review, get_review, list_reviews, reset_all_votes, reset_votes,
    seed_all_votes, update_review,
};
pub use admin_users::{change_password, list_users, login, me};
pub use game::{play, vote};
pub use moderation::{approve, list_pending, reject};
pub use rate_limits::{block_ip, delete_rate_limit, list_rate_limits, unblock_ip};
pub use submit::{captcha, submit_review};
