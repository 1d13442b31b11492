//! Stats service
//!
//! Site-wide totals for the admin dashboard and the public live-stats
//! endpoint. Totals are cheap aggregate queries, cached briefly since the
//! dashboard polls them.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{ArticleRepository, UserRepository};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for site totals
const STATS_CACHE_TTL_SECS: u64 = 60;

/// Cache key for site totals
pub(crate) const CACHE_KEY_SITE_STATS: &str = "stats:site";

/// Site-wide aggregate counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteStats {
    pub total_articles: i64,
    pub total_users: i64,
    pub total_views: i64,
    pub total_likes: i64,
}

/// Stats service
pub struct StatsService {
    article_repo: Arc<dyn ArticleRepository>,
    user_repo: Arc<dyn UserRepository>,
    cache: Arc<Cache>,
}

impl StatsService {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        user_repo: Arc<dyn UserRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            article_repo,
            user_repo,
            cache,
        }
    }

    /// Site totals, cached briefly
    pub async fn site_stats(&self) -> anyhow::Result<SiteStats> {
        if let Ok(Some(cached)) = self.cache.get::<SiteStats>(CACHE_KEY_SITE_STATS).await {
            return Ok(cached);
        }

        let stats = SiteStats {
            total_articles: self
                .article_repo
                .count()
                .await
                .context("Failed to count articles")?,
            total_users: self
                .user_repo
                .count()
                .await
                .context("Failed to count users")?,
            total_views: self
                .article_repo
                .total_views()
                .await
                .context("Failed to sum views")?,
            total_likes: self
                .article_repo
                .total_likes()
                .await
                .context("Failed to sum likes")?,
        };

        let _ = self
            .cache
            .set(
                CACHE_KEY_SITE_STATS,
                &stats,
                Duration::from_secs(STATS_CACHE_TTL_SECS),
            )
            .await;

        Ok(stats)
    }

    /// Uncached article count for the live-stats endpoint
    pub async fn total_articles(&self) -> anyhow::Result<i64> {
        self.article_repo
            .count()
            .await
            .context("Failed to count articles")
    }
}
