//! Profile service
//!
//! Profile reads and upserts plus the per-author activity stats shown on
//! the profile page. A user without a saved profile row still gets a view
//! (account fields with empty profile fields).

use crate::db::repositories::ProfileRepository;
use crate::models::{AuthorStats, Profile, ProfileView, UpdateProfileInput};
use anyhow::Context;
use std::sync::Arc;

/// Error types for profile service operations
#[derive(Debug, thiserror::Error)]
pub enum ProfileServiceError {
    /// User not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Profile service
pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn ProfileRepository>) -> Self {
        Self { repo }
    }

    /// Get a user's profile joined with their account fields
    pub async fn get(&self, user_id: i64) -> Result<ProfileView, ProfileServiceError> {
        let view = self
            .repo
            .get_view(user_id)
            .await
            .context("Failed to get profile")?
            .ok_or_else(|| ProfileServiceError::NotFound(format!("User {} not found", user_id)))?;

        Ok(view)
    }

    /// Replace the user's profile fields as a unit
    pub async fn update(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> Result<Profile, ProfileServiceError> {
        input
            .validate()
            .map_err(ProfileServiceError::ValidationError)?;

        let profile = self
            .repo
            .upsert(user_id, &input)
            .await
            .context("Failed to update profile")?;

        Ok(profile)
    }

    /// Activity counters for the user's profile page
    pub async fn stats(&self, user_id: i64) -> Result<AuthorStats, ProfileServiceError> {
        let stats = self
            .repo
            .author_stats(user_id)
            .await
            .context("Failed to load author stats")?;

        Ok(stats)
    }
}
