//! Profile model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted bio length in characters
pub const MAX_BIO_LEN: usize = 1_000;

/// Editable profile fields, keyed by user ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user ID
    pub user_id: i64,
    /// Display name
    pub full_name: Option<String>,
    /// Short biography
    pub bio: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Profile joined with account fields, as served to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Account email (from the users table)
    pub email: String,
    /// Account creation timestamp (join date)
    pub created_at: DateTime<Utc>,
}

/// Input for updating a profile; the three fields are upserted as a unit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdateProfileInput {
    /// Validate field lengths
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.full_name {
            if name.chars().count() > 100 {
                return Err("Full name exceeds 100 characters".to_string());
            }
        }
        if let Some(bio) = &self.bio {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(format!("Bio exceeds {} characters", MAX_BIO_LEN));
            }
        }
        Ok(())
    }
}

/// Aggregate activity counters for one author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorStats {
    /// Articles submitted by this user
    pub articles_count: i64,
    /// Comments posted by this user
    pub comments_count: i64,
    /// Total views across the user's articles
    pub total_views: i64,
    /// Total likes across the user's articles
    pub total_likes: i64,
}
