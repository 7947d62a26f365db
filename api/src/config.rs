use std::env;

use anyhow::{bail, Context};
use chrono::Duration;

use crate::domain::entities::{RateLimitPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_MINUTES};

const DEV_SESSION_SECRET: &str = "dev-session-secret-not-for-production";

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    /// Key for signing admin sessions and CAPTCHA tokens
    pub session_secret: String,
    pub port: u16,
    pub rate_limit_window_minutes: i64,
    pub rate_limit_max_attempts: i32,
    pub captcha_ttl_minutes: i64,
    pub session_ttl_hours: i64,
    /// Take the client IP from `X-Forwarded-For` (only behind a trusted proxy)
    pub trust_forwarded_for: bool,
    /// Bootstrap admin created at startup when missing
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let session_secret = match get("SESSION_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("SESSION_SECRET not set, using an insecure development key");
                DEV_SESSION_SECRET.to_string()
            }
        };

        let config = Self {
            database_url,
            session_secret,
            port: parse_or(&get, "PORT", 8080)?,
            rate_limit_window_minutes: parse_or(
                &get,
                "RATE_LIMIT_WINDOW_MINUTES",
                DEFAULT_WINDOW_MINUTES,
            )?,
            rate_limit_max_attempts: parse_or(&get, "RATE_LIMIT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            captcha_ttl_minutes: parse_or(&get, "CAPTCHA_TTL_MINUTES", 10)?,
            session_ttl_hours: parse_or(&get, "SESSION_TTL_HOURS", 12)?,
            trust_forwarded_for: parse_or(&get, "TRUST_FORWARDED_FOR", false)?,
            admin_username: get("ADMIN_USERNAME").filter(|s| !s.is_empty()),
            admin_password: get("ADMIN_PASSWORD").filter(|s| !s.is_empty()),
        };

        if config.rate_limit_window_minutes <= 0 || config.rate_limit_max_attempts <= 0 {
            bail!("Rate limit window and max attempts must be positive");
        }

        Ok(config)
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            Duration::minutes(self.rate_limit_window_minutes),
            self.rate_limit_max_attempts,
        )
    }

    pub fn captcha_ttl(&self) -> Duration {
        Duration::minutes(self.captcha_ttl_minutes)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }

    /// Bootstrap credentials, if both are configured
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}={:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}
