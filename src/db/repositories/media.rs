//! Article media repository
//!
//! Database operations for media attachments (images and videos) linked to
//! articles. Rows cascade away with their article.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ArticleMedia, MediaKind};

/// Media repository trait
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Attach a media file to an article
    async fn create(
        &self,
        article_id: i64,
        file_url: &str,
        file_type: MediaKind,
        file_name: &str,
    ) -> Result<ArticleMedia>;

    /// List media for an article in insertion order
    async fn list_by_article(&self, article_id: i64) -> Result<Vec<ArticleMedia>>;
}

/// SQLx-based media repository implementation
pub struct SqlxMediaRepository {
    pool: DynDatabasePool,
}

impl SqlxMediaRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MediaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MediaRepository for SqlxMediaRepository {
    async fn create(
        &self,
        article_id: i64,
        file_url: &str,
        file_type: MediaKind,
        file_name: &str,
    ) -> Result<ArticleMedia> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    article_id,
                    file_url,
                    file_type,
                    file_name,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                create_mysql(
                    self.pool.as_mysql().unwrap(),
                    article_id,
                    file_url,
                    file_type,
                    file_name,
                )
                .await
            }
        }
    }

    async fn list_by_article(&self, article_id: i64) -> Result<Vec<ArticleMedia>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_article_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_article_mysql(self.pool.as_mysql().unwrap(), article_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    file_url: &str,
    file_type: MediaKind,
    file_name: &str,
) -> Result<ArticleMedia> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO article_media (article_id, file_url, file_type, file_name, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(article_id)
    .bind(file_url)
    .bind(file_type.as_str())
    .bind(file_name)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create media record")?;

    Ok(ArticleMedia {
        id: result.last_insert_rowid(),
        article_id,
        file_url: file_url.to_string(),
        file_type,
        file_name: file_name.to_string(),
        created_at: now,
    })
}

async fn list_by_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<ArticleMedia>> {
    let rows = sqlx::query(
        r#"
        SELECT id, article_id, file_url, file_type, file_name, created_at
        FROM article_media
        WHERE article_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list media")?;

    let mut media = Vec::new();
    for row in &rows {
        media.push(row_to_media_sqlite(row)?);
    }
    Ok(media)
}

fn row_to_media_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ArticleMedia> {
    let kind_str: String = row.get("file_type");
    let file_type = MediaKind::parse(&kind_str)
        .ok_or_else(|| anyhow!("Invalid media kind in database: {}", kind_str))?;

    Ok(ArticleMedia {
        id: row.get("id"),
        article_id: row.get("article_id"),
        file_url: row.get("file_url"),
        file_type,
        file_name: row.get("file_name"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(
    pool: &MySqlPool,
    article_id: i64,
    file_url: &str,
    file_type: MediaKind,
    file_name: &str,
) -> Result<ArticleMedia> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO article_media (article_id, file_url, file_type, file_name, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(article_id)
    .bind(file_url)
    .bind(file_type.as_str())
    .bind(file_name)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create media record")?;

    Ok(ArticleMedia {
        id: result.last_insert_id() as i64,
        article_id,
        file_url: file_url.to_string(),
        file_type,
        file_name: file_name.to_string(),
        created_at: now,
    })
}

async fn list_by_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<ArticleMedia>> {
    let rows = sqlx::query(
        r#"
        SELECT id, article_id, file_url, file_type, file_name, created_at
        FROM article_media
        WHERE article_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list media")?;

    let mut media = Vec::new();
    for row in &rows {
        media.push(row_to_media_mysql(row)?);
    }
    Ok(media)
}

fn row_to_media_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ArticleMedia> {
    let kind_str: String = row.get("file_type");
    let file_type = MediaKind::parse(&kind_str)
        .ok_or_else(|| anyhow!("Invalid media kind in database: {}", kind_str))?;

    Ok(ArticleMedia {
        id: row.get("id"),
        article_id: row.get("article_id"),
        file_url: row.get("file_url"),
        file_type,
        file_name: row.get("file_name"),
        created_at: row.get("created_at"),
    })
}
