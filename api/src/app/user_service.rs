//! User service
//!
//! Admin authentication, password changes and startup bootstrap of the first
//! admin account.

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;

use crate::domain::entities::{NewUser, User, UserId};
use crate::domain::ports::{Clock, UserRepository};
use crate::error::{AppError, DomainError};

pub struct UserService<UR, C>
where
    UR: UserRepository,
    C: Clock,
{
    repo: Arc<UR>,
    clock: Arc<C>,
}

impl<UR, C> UserService<UR, C>
where
    UR: UserRepository,
    C: Clock,
{
    pub fn new(repo: Arc<UR>, clock: Arc<C>) -> Self {
        Self { repo, clock }
    }

    /// Check admin credentials.
    ///
    /// Unknown users, non-admins and wrong passwords all yield the same
    /// `Unauthorized` so the response does not reveal which part failed.
    pub async fn authenticate_admin(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self.repo.find_by_username(username.trim()).await?;

        match user {
            Some(user) if user.is_admin && verify_password(password, &user.password_hash) => {
                tracing::info!(user_id = %user.id, "Admin logged in");
                Ok(user)
            }
            _ => {
                tracing::warn!(username, "Failed admin login");
                Err(AppError::Unauthorized)
            }
        }
    }

    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AppError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn change_password(
        &self,
        id: &UserId,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|u| u.is_admin)
            .ok_or(AppError::Forbidden)?;

        if !verify_password(current_password, &user.password_hash) {
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }

        if new_password.is_empty() {
            return Err(AppError::BadRequest("New password is required".to_string()));
        }

        if new_password != confirm_password {
            return Err(AppError::BadRequest(
                "New passwords do not match".to_string(),
            ));
        }

        let hash = hash_password(new_password)?;
        self.repo.update_password_hash(id, &hash).await?;

        tracing::info!(user_id = %id, "Admin password changed");
        Ok(())
    }

    pub async fn create_admin(&self, username: &str, password: &str) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Domain(DomainError::Validation(
                "Username and password are required".to_string(),
            )));
        }

        if self.repo.find_by_username(username).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "User {}",
                username
            ))));
        }

        let user = self
            .repo
            .create(&NewUser {
                username: username.to_string(),
                password_hash: hash_password(password)?,
                is_admin: true,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(user_id = %user.id, username, "Admin user created");
        Ok(user)
    }

    /// Create the bootstrap admin unless a user with that name already exists.
    /// Returns true when a user was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
        if self.repo.find_by_username(username.trim()).await?.is_some() {
            tracing::debug!(username, "Bootstrap admin already present");
            return Ok(false);
        }
        self.create_admin(username, password).await?;
        Ok(true)
    }
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding failed: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC hash string
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_admin, test_user, FixedClock, InMemoryUserRepository};

    fn create_service(
        repo: InMemoryUserRepository,
    ) -> UserService<InMemoryUserRepository, FixedClock> {
        UserService::new(Arc::new(repo), Arc::new(FixedClock::default()))
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn authenticate_valid_admin() {
        let admin = test_admin("admin", "hunter2");
        let service = create_service(InMemoryUserRepository::new().with_user(admin.clone()));

        let user = service.authenticate_admin("admin", "hunter2").await.unwrap();

        assert_eq!(user.id, admin.id);
    }

    #[tokio::test]
    async fn authenticate_wrong_password() {
        let service = create_service(
            InMemoryUserRepository::new().with_user(test_admin("admin", "hunter2")),
        );

        assert!(matches!(
            service.authenticate_admin("admin", "wrong").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn authenticate_unknown_user() {
        let service = create_service(InMemoryUserRepository::new());

        assert!(matches!(
            service.authenticate_admin("ghost", "x").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn authenticate_non_admin_is_refused() {
        let service = create_service(
            InMemoryUserRepository::new().with_user(test_user("player", "pw")),
        );

        assert!(matches!(
            service.authenticate_admin("player", "pw").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn change_password_success() {
        let admin = test_admin("admin", "old-pass");
        let service = create_service(InMemoryUserRepository::new().with_user(admin.clone()));

        service
            .change_password(&admin.id, "old-pass", "new-pass", "new-pass")
            .await
            .unwrap();

        assert!(service.authenticate_admin("admin", "new-pass").await.is_ok());
        assert!(service.authenticate_admin("admin", "old-pass").await.is_err());
    }

    #[tokio::test]
    async fn change_password_wrong_current() {
        let admin = test_admin("admin", "old-pass");
        let service = create_service(InMemoryUserRepository::new().with_user(admin.clone()));

        let result = service
            .change_password(&admin.id, "nope", "new-pass", "new-pass")
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn change_password_mismatch() {
        let admin = test_admin("admin", "old-pass");
        let service = create_service(InMemoryUserRepository::new().with_user(admin.clone()));

        let result = service
            .change_password(&admin.id, "old-pass", "new-pass", "other-pass")
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.contains("match")));
    }

    #[tokio::test]
    async fn change_password_empty() {
        let admin = test_admin("admin", "old-pass");
        let service = create_service(InMemoryUserRepository::new().with_user(admin.clone()));

        let result = service.change_password(&admin.id, "old-pass", "", "").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn create_admin_rejects_duplicate() {
        let service = create_service(
            InMemoryUserRepository::new().with_user(test_admin("admin", "pw")),
        );

        assert!(matches!(
            service.create_admin("admin", "pw2").await,
            Err(AppError::Domain(DomainError::AlreadyExists(_)))
        ));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let service = create_service(InMemoryUserRepository::new());

        assert!(service.ensure_admin("root", "s3cret").await.unwrap());
        assert!(!service.ensure_admin("root", "different").await.unwrap());

        let users = service.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin);
        assert_eq!(users[0].created_at, FixedClock::default().now());
        assert!(service.authenticate_admin("root", "s3cret").await.is_ok());
    }
}
