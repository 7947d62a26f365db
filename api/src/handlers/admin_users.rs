//! Admin authentication and user handlers

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::domain::entities::User;
use crate::domain::ports::Clock;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Send as `Authorization: Bearer <token>`
    pub token: String,
    pub expires_in_seconds: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// POST /admin/login
///
/// Exchange admin credentials for a session token. Any failure is a plain 401.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .user_service
        .authenticate_admin(&request.username, &request.password)
        .await?;

    let token = state.session_tokens.issue(&user.id, state.clock.now());

    Ok(Json(LoginResponse {
        token,
        expires_in_seconds: state.session_tokens.ttl().num_seconds(),
        user: UserResponse::from(&user),
    }))
}

/// GET /admin/me
pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// POST /admin/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    state
        .user_service
        .change_password(
            &user.id,
            &request.current_password,
            &request.new_password,
            &request.confirm_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_admin;

    #[test]
    fn user_response_has_no_hash() {
        let admin = test_admin("admin", "pw");

        let json = serde_json::to_string(&UserResponse::from(&admin)).unwrap();

        assert!(json.contains("\"username\":\"admin\""));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn parse_change_password_request() {
        let json = r#"{"current_password": "a", "new_password": "b", "confirm_password": "b"}"#;
        let request: ChangePasswordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.new_password, request.confirm_password);
    }

    #[test]
    fn parse_login_request_requires_password() {
        assert!(serde_json::from_str::<LoginRequest>(r#"{"username": "admin"}"#).is_err());
    }
}
