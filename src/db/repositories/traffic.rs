//! Traffic repository
//!
//! Append-only storage for page-view events plus the aggregate queries that
//! back the admin traffic dashboard. Time windows are computed in UTC by the
//! caller-independent helpers here so SQLite and MySQL agree on boundaries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{PageCount, TrackEventInput, TrafficEvent, TrafficSummary};

/// Number of pages reported in the summary's top-pages list
const TOP_PAGES_LIMIT: i64 = 5;

/// Traffic repository trait
#[async_trait]
pub trait TrafficRepository: Send + Sync {
    /// Record a page-view event
    async fn record(
        &self,
        input: &TrackEventInput,
        user_agent: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<TrafficEvent>;

    /// Aggregate view and session counts for the dashboard
    async fn summary(&self) -> Result<TrafficSummary>;

    /// Delete events older than the given number of days.
    /// Returns the number of rows removed.
    async fn prune_older_than(&self, days: i64) -> Result<i64>;
}

/// SQLx-based traffic repository implementation
pub struct SqlxTrafficRepository {
    pool: DynDatabasePool,
}

impl SqlxTrafficRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TrafficRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Start of the current UTC day
fn today_start() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl TrafficRepository for SqlxTrafficRepository {
    async fn record(
        &self,
        input: &TrackEventInput,
        user_agent: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<TrafficEvent> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                record_sqlite(self.pool.as_sqlite().unwrap(), input, user_agent, user_id).await
            }
            DatabaseDriver::Mysql => {
                record_mysql(self.pool.as_mysql().unwrap(), input, user_agent, user_id).await
            }
        }
    }

    async fn summary(&self) -> Result<TrafficSummary> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => summary_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => summary_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn prune_older_than(&self, days: i64) -> Result<i64> {
        let cutoff = Utc::now() - Duration::days(days);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let result = sqlx::query("DELETE FROM traffic_events WHERE created_at < ?")
                    .bind(cutoff)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to prune traffic events")?;
                Ok(result.rows_affected() as i64)
            }
            DatabaseDriver::Mysql => {
                let result = sqlx::query("DELETE FROM traffic_events WHERE created_at < ?")
                    .bind(cutoff)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to prune traffic events")?;
                Ok(result.rows_affected() as i64)
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn record_sqlite(
    pool: &SqlitePool,
    input: &TrackEventInput,
    user_agent: Option<&str>,
    user_id: Option<i64>,
) -> Result<TrafficEvent> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO traffic_events (page_path, user_agent, referrer, session_id, user_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.page_path)
    .bind(user_agent)
    .bind(&input.referrer)
    .bind(&input.session_id)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to record traffic event")?;

    Ok(TrafficEvent {
        id: result.last_insert_rowid(),
        page_path: input.page_path.clone(),
        user_agent: user_agent.map(str::to_string),
        referrer: input.referrer.clone(),
        session_id: input.session_id.clone(),
        user_id,
        created_at: now,
    })
}

async fn summary_sqlite(pool: &SqlitePool) -> Result<TrafficSummary> {
    let day_start = today_start();
    let week_start = Utc::now() - Duration::days(7);

    let views_today: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM traffic_events WHERE created_at >= ?")
            .bind(day_start)
            .fetch_one(pool)
            .await
            .context("Failed to count today's views")?;

    let views_week: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM traffic_events WHERE created_at >= ?")
            .bind(week_start)
            .fetch_one(pool)
            .await
            .context("Failed to count weekly views")?;

    let sessions_today: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT session_id) FROM traffic_events WHERE created_at >= ?",
    )
    .bind(day_start)
    .fetch_one(pool)
    .await
    .context("Failed to count today's sessions")?;

    let rows = sqlx::query(
        r#"
        SELECT page_path, COUNT(*) as views
        FROM traffic_events
        WHERE created_at >= ?
        GROUP BY page_path
        ORDER BY views DESC, page_path ASC
        LIMIT ?
        "#,
    )
    .bind(week_start)
    .bind(TOP_PAGES_LIMIT)
    .fetch_all(pool)
    .await
    .context("Failed to aggregate top pages")?;

    let top_pages = rows
        .iter()
        .map(|r| PageCount {
            page_path: r.get("page_path"),
            views: r.get("views"),
        })
        .collect();

    Ok(TrafficSummary {
        views_today,
        views_week,
        sessions_today,
        top_pages,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn record_mysql(
    pool: &MySqlPool,
    input: &TrackEventInput,
    user_agent: Option<&str>,
    user_id: Option<i64>,
) -> Result<TrafficEvent> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO traffic_events (page_path, user_agent, referrer, session_id, user_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.page_path)
    .bind(user_agent)
    .bind(&input.referrer)
    .bind(&input.session_id)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to record traffic event")?;

    Ok(TrafficEvent {
        id: result.last_insert_id() as i64,
        page_path: input.page_path.clone(),
        user_agent: user_agent.map(str::to_string),
        referrer: input.referrer.clone(),
        session_id: input.session_id.clone(),
        user_id,
        created_at: now,
    })
}

async fn summary_mysql(pool: &MySqlPool) -> Result<TrafficSummary> {
    let day_start = today_start();
    let week_start = Utc::now() - Duration::days(7);

    let views_today: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM traffic_events WHERE created_at >= ?")
            .bind(day_start)
            .fetch_one(pool)
            .await
            .context("Failed to count today's views")?;

    let views_week: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM traffic_events WHERE created_at >= ?")
            .bind(week_start)
            .fetch_one(pool)
            .await
            .context("Failed to count weekly views")?;

    let sessions_today: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT session_id) FROM traffic_events WHERE created_at >= ?",
    )
    .bind(day_start)
    .fetch_one(pool)
    .await
    .context("Failed to count today's sessions")?;

    let rows = sqlx::query(
        r#"
        SELECT page_path, COUNT(*) as views
        FROM traffic_events
        WHERE created_at >= ?
        GROUP BY page_path
        ORDER BY views DESC, page_path ASC
        LIMIT ?
        "#,
    )
    .bind(week_start)
    .bind(TOP_PAGES_LIMIT)
    .fetch_all(pool)
    .await
    .context("Failed to aggregate top pages")?;

    let top_pages = rows
        .iter()
        .map(|r| PageCount {
            page_path: r.get("page_path"),
            views: r.get("views"),
        })
        .collect();

    Ok(TrafficSummary {
        views_today,
        views_week,
        sessions_today,
        top_pages,
    })
}
