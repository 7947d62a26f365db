//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities and ports.

pub mod captcha_service;
pub mod game_config;
pub mod rate_limit_service;
pub mod review_service;
pub mod user_service;

pub use captcha_service::CaptchaService;
pub use rate_limit_service::RateLimitService;
pub use review_service::ReviewService;
pub use user_service::UserService;
