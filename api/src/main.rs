//! Bottles or Cans API Server
//!
//! A small voting game: players read a review and guess whether it describes
//! headphones or wine. Admins moderate submissions, manage rate limits and
//! administer users.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{
    ensure_schema, PostgresPendingReviewRepository, PostgresRateLimitRepository,
    PostgresReviewRepository, PostgresUserRepository,
};
use app::{CaptchaService, RateLimitService, ReviewService, UserService};
use auth::{SessionTokens, TokenSigner};
use config::Config;
use domain::ports::SystemClock;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub review_service: Arc<
        ReviewService<PostgresReviewRepository, PostgresPendingReviewRepository, SystemClock>,
    >,
    pub rate_limit_service: Arc<RateLimitService<PostgresRateLimitRepository, SystemClock>>,
    pub user_service: Arc<UserService<PostgresUserRepository, SystemClock>>,
    pub captcha_service: Arc<CaptchaService<SystemClock>>,
    pub session_tokens: Arc<SessionTokens>,
    pub clock: Arc<SystemClock>,
    pub config: Config,
}

impl AppState {
    /// Wire services over a database connection
    pub fn new(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        let clock = Arc::new(SystemClock);
        let signer = TokenSigner::new(&config.session_secret);

        let review_repo = Arc::new(PostgresReviewRepository::new(db.clone()));
        let pending_repo = Arc::new(PostgresPendingReviewRepository::new(db.clone()));
        let rate_limit_repo = Arc::new(PostgresRateLimitRepository::new(db.clone()));
        let user_repo = Arc::new(PostgresUserRepository::new(db));

        Self {
            review_service: Arc::new(ReviewService::new(
                review_repo,
                pending_repo,
                clock.clone(),
            )),
            rate_limit_service: Arc::new(RateLimitService::new(
                rate_limit_repo,
                clock.clone(),
                config.rate_limit_policy(),
            )),
            user_service: Arc::new(UserService::new(user_repo, clock.clone())),
            captcha_service: Arc::new(CaptchaService::new(
                signer.clone(),
                config.captcha_ttl(),
                clock.clone(),
            )),
            session_tokens: Arc::new(SessionTokens::new(signer, config.session_ttl())),
            clock,
            config,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full router. `login_throttle` wraps the login route when set.
pub fn build_router(state: AppState, login_throttle: bool) -> anyhow::Result<Router> {
    let mut login_routes = Router::new().route("/admin/login", post(handlers::login));

    if login_throttle {
        // 1 req/sec sustained, burst of 5, keyed by peer IP
        let governor_config = Arc::new(
            GovernorConfigBuilder::default()
                .key_extractor(PeerIpKeyExtractor)
                .per_second(1)
                .burst_size(5)
                .finish()
                .context("Failed to build governor config")?,
        );
        login_routes = login_routes.layer(GovernorLayer {
            config: governor_config,
        });
    }

    // Admin routes (session token required)
    let admin_routes = Router::new()
        .route("/admin/me", get(handlers::me))
        .route("/admin/users", get(handlers::list_users))
        .route(
            "/admin/users/change-password",
            post(handlers::change_password),
        )
        // Reviews
        .route(
            "/admin/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .route(
            "/admin/reviews/:id",
            get(handlers::get_review)
                .put(handlers::update_review)
                .delete(handlers::delete_review),
        )
        .route(
            "/admin/reviews/:id/reset-votes",
            post(handlers::reset_votes),
        )
        .route(
            "/admin/reviews/reset-all-votes",
            post(handlers::reset_all_votes),
        )
        .route("/admin/reviews/seed-votes", post(handlers::seed_all_votes))
        // Moderation
        .route("/admin/pending-reviews", get(handlers::list_pending))
        .route(
            "/admin/pending-reviews/:id/approve",
            post(handlers::approve),
        )
        .route("/admin/pending-reviews/:id/reject", post(handlers::reject))
        // Rate limits
        .route("/admin/rate-limits", get(handlers::list_rate_limits))
        .route(
            "/admin/rate-limits/:ip",
            delete(handlers::delete_rate_limit),
        )
        .route("/admin/rate-limits/:ip/block", post(handlers::block_ip))
        .route("/admin/rate-limits/:ip/unblock", post(handlers::unblock_ip))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_auth_middleware,
        ));

    // Submission (admin session optional)
    let submit_routes = Router::new()
        .route("/submit-review", post(handlers::submit_review))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::optional_admin_middleware,
        ));

    let app = Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        // Game
        .route("/play", get(handlers::play))
        .route("/vote", post(handlers::vote))
        // CAPTCHA
        .route("/captcha", get(handlers::captcha))
        .route("/captcha/refresh", post(handlers::captcha))
        .merge(submit_routes)
        .merge(login_routes)
        .merge(admin_routes)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bottles_or_cans_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bottles or Cans API...");

    // Load configuration
    let config = Config::from_env()?;

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    ensure_schema(&db)
        .await
        .context("Failed to create database tables")?;
    tracing::info!("Database connected");

    let port = config.port;
    let state = AppState::new(db, config);

    if let Some((username, password)) = state.config.bootstrap_admin() {
        if state.user_service.ensure_admin(username, password).await? {
            tracing::info!(username, "Bootstrap admin created");
        }
    }

    let app = build_router(state, true)?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
