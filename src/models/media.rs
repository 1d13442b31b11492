//! Article media model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Parse from database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Media attachment on an article
///
/// Rows exist only for uploads that both landed on disk and recorded
/// successfully. A partially failed batch upload leaves an article with
/// fewer media rows than intended; that is accepted behavior and the
/// upload response reports which files failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMedia {
    /// Unique identifier
    pub id: i64,
    /// Article this attachment belongs to
    pub article_id: i64,
    /// Publicly resolvable URL (/uploads/...)
    pub file_url: String,
    /// Image or video
    pub file_type: MediaKind,
    /// Original file name as uploaded
    pub file_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
