//! Bearer token authentication middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::domain::entities::User;
use crate::domain::ports::Clock;
use crate::error::AppError;
use crate::AppState;

/// Extract the session token from the Authorization header
fn extract_bearer(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Resolve a bearer token to an admin user, if it is valid
async fn resolve_admin(state: &AppState, token: &str) -> Result<Option<User>, AppError> {
    let Some(user_id) = state.session_tokens.verify(token, state.clock.now()) else {
        return Ok(None);
    };

    let user = state.user_service.find_by_id(&user_id).await?;
    Ok(user.filter(|u| u.is_admin))
}

/// Admin authentication middleware
///
/// Validates the session token and injects the admin `User` into request
/// extensions. Every `/admin` route except login sits behind this.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(&request).ok_or(AppError::Unauthorized)?;

    let user = resolve_admin(&state, token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Optional admin middleware
///
/// Like `admin_auth_middleware` but never rejects. The `User` is absent from
/// extensions when no valid admin token was sent.
pub async fn optional_admin_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer(&request) {
        match resolve_admin(&state, token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve admin session");
            }
        }
    }

    next.run(request).await
}
