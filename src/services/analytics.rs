//! Analytics service
//!
//! Fire-and-forget page-view ingest plus the aggregate queries behind the
//! admin traffic dashboard. Ingest validates the payload and records the
//! event; nothing downstream depends on a given event arriving.

use crate::db::repositories::TrafficRepository;
use crate::models::{TrackEventInput, TrafficEvent, TrafficSummary};
use anyhow::Context;
use std::sync::Arc;

/// Events older than this are swept by the background maintenance task
const RETENTION_DAYS: i64 = 90;

/// Error types for analytics service operations
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Analytics service
pub struct AnalyticsService {
    repo: Arc<dyn TrafficRepository>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn TrafficRepository>) -> Self {
        Self { repo }
    }

    /// Record one page-view event
    pub async fn record(
        &self,
        input: TrackEventInput,
        user_agent: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<TrafficEvent, AnalyticsServiceError> {
        input
            .validate()
            .map_err(AnalyticsServiceError::ValidationError)?;

        let event = self
            .repo
            .record(&input, user_agent, user_id)
            .await
            .context("Failed to record traffic event")?;

        Ok(event)
    }

    /// Aggregates for the admin traffic dashboard
    pub async fn summary(&self) -> Result<TrafficSummary, AnalyticsServiceError> {
        let summary = self
            .repo
            .summary()
            .await
            .context("Failed to load traffic summary")?;

        Ok(summary)
    }

    /// Drop events past the retention window. Returns rows removed.
    pub async fn prune(&self) -> Result<i64, AnalyticsServiceError> {
        let removed = self
            .repo
            .prune_older_than(RETENTION_DAYS)
            .await
            .context("Failed to prune traffic events")?;

        Ok(removed)
    }
}
