//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted comment length in characters
pub const MAX_COMMENT_LEN: usize = 2_000;

/// Comment entity
///
/// Comments are append-only from the reader's perspective; only the
/// comment author or an admin may delete one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// Article this comment belongs to
    pub article_id: i64,
    /// Commenting user ID
    pub user_id: i64,
    /// Display name at the time of posting
    pub author_name: String,
    /// Comment text
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    /// Comment text
    pub content: String,
}

impl CreateCommentInput {
    /// Validate the comment body
    pub fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("Comment cannot be empty".to_string());
        }
        if self.content.chars().count() > MAX_COMMENT_LEN {
            return Err(format!("Comment exceeds {} characters", MAX_COMMENT_LEN));
        }
        Ok(())
    }
}
