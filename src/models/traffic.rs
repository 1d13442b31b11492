//! Traffic analytics model
//!
//! Page-view events are fire-and-forget from the client's perspective:
//! ingest never fails a page load, and the rows are only read back by
//! admin-side aggregate queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded page view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficEvent {
    /// Unique identifier
    pub id: i64,
    /// Path of the viewed page
    pub page_path: String,
    /// Browser user agent, if sent
    pub user_agent: Option<String>,
    /// Referring URL, if any
    pub referrer: Option<String>,
    /// Client-generated opaque session identifier
    pub session_id: String,
    /// Logged-in user, if any
    pub user_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Ingest payload for a page view
#[derive(Debug, Clone, Deserialize)]
pub struct TrackEventInput {
    pub page_path: String,
    #[serde(default)]
    pub referrer: Option<String>,
    pub session_id: String,
}

impl TrackEventInput {
    /// Validate the payload; invalid events are dropped, never stored
    pub fn validate(&self) -> Result<(), String> {
        if self.page_path.trim().is_empty() || self.page_path.len() > 500 {
            return Err("Invalid page path".to_string());
        }
        if self.session_id.trim().is_empty() || self.session_id.len() > 100 {
            return Err("Invalid session id".to_string());
        }
        Ok(())
    }
}

/// A page path with its view count, for the admin traffic report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCount {
    pub page_path: String,
    pub views: i64,
}

/// Aggregated traffic counters for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSummary {
    /// Page views in the last 24 hours
    pub views_today: i64,
    /// Page views in the last 7 days
    pub views_week: i64,
    /// Distinct client sessions in the last 24 hours
    pub sessions_today: i64,
    /// Most viewed pages over the last 7 days
    pub top_pages: Vec<PageCount>,
}
