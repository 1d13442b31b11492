//! User service
//!
//! Business logic for accounts and authentication: registration (the first
//! account becomes admin), login by username or email, logout, and session
//! token validation with lazy expiry cleanup.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Minimum accepted password length
const MIN_PASSWORD_LENGTH: usize = 6;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user.
    ///
    /// The first account in an empty database is created with the admin
    /// role; everyone after that is a member.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let role = if self.is_first_user().await? {
            UserRole::Admin
        } else {
            UserRole::Member
        };

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(input.username, input.email, password_hash, role);

        let created_user = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created_user)
    }

    /// Login with username or email plus password.
    ///
    /// Returns a fresh session on success. Credential failures are reported
    /// with a single generic message so the response does not reveal which
    /// part was wrong.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError(
                    "Invalid username or password".to_string(),
                )
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;

        Ok(session)
    }

    /// Logout (invalidate session). Deleting a session that no longer
    /// exists is not an error.
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate a session token and return the associated user.
    ///
    /// Expired sessions are deleted on sight and treated as absent, so the
    /// caller only ever sees a live session or `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Check if the next registration would be the first user
    pub async fn is_first_user(&self) -> Result<bool, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;

        Ok(count == 0)
    }

    /// List users for the admin view, newest first
    pub async fn list_users(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<User>, i64), UserServiceError> {
        let result = self
            .user_repo
            .list(page, per_page)
            .await
            .context("Failed to list users")?;

        Ok(result)
    }

    /// Change a user's role.
    ///
    /// Demoting the final admin is rejected; the system must always keep at
    /// least one admin account.
    pub async fn set_role(
        &self,
        target_id: i64,
        role: UserRole,
    ) -> Result<User, UserServiceError> {
        let target = self
            .user_repo
            .get_by_id(target_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| {
                UserServiceError::ValidationError(format!("User {} not found", target_id))
            })?;

        if target.role == UserRole::Admin && role == UserRole::Member {
            let admins = self
                .user_repo
                .count_by_role(UserRole::Admin)
                .await
                .context("Failed to count admins")?;
            if admins <= 1 {
                return Err(UserServiceError::ValidationError(
                    "Cannot remove the last admin".to_string(),
                ));
            }
        }

        self.user_repo
            .set_role(target_id, role)
            .await
            .context("Failed to set role")?;

        let updated = self
            .user_repo
            .get_by_id(target_id)
            .await
            .context("Failed to reload user")?
            .ok_or_else(|| {
                UserServiceError::ValidationError(format!("User {} not found", target_id))
            })?;

        Ok(updated)
    }

    /// Delete all expired sessions. Called periodically from the
    /// background maintenance task. Returns the number removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }

        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        // Basic email format validation
        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if input.password.len() < MIN_PASSWORD_LENGTH {
            return Err(UserServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        let user = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?;

        Ok(user)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::new(user_id, self.session_expiration_days);

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
