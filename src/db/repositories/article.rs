//! Article repository
//!
//! Database operations for articles and article likes.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL
//!
//! Counters (`views_count`, `likes_count`, `comments_count`) are only ever
//! moved with atomic `UPDATE .. SET x = x + 1` statements so that concurrent
//! requests cannot lose updates. The like toggle runs in a single transaction
//! keyed off the UNIQUE(article_id, user_id) constraint.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleListParams, Category, PagedResult};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LikeToggle {
    /// Whether the user likes the article after the toggle
    pub liked: bool,
    /// The article's like count after the toggle
    pub likes_count: i64,
}

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Get an article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// List articles, newest first, optionally filtered by category
    async fn list(&self, params: &ArticleListParams) -> Result<PagedResult<Article>>;

    /// Delete an article. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Atomically increment the view counter. Returns false if the article
    /// does not exist.
    async fn increment_views(&self, id: i64) -> Result<bool>;

    /// Toggle a user's like on an article in a single transaction
    async fn toggle_like(&self, article_id: i64, user_id: i64) -> Result<LikeToggle>;

    /// Check whether a user currently likes an article
    async fn is_liked(&self, article_id: i64, user_id: i64) -> Result<bool>;

    /// Get the set of article IDs a user likes among the given IDs
    async fn liked_ids(&self, user_id: i64, article_ids: &[i64]) -> Result<Vec<i64>>;

    /// Count total articles
    async fn count(&self) -> Result<i64>;

    /// Sum of view counters across all articles
    async fn total_views(&self) -> Result<i64>;

    /// Sum of like counters across all articles
    async fn total_likes(&self) -> Result<i64>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_article_sqlite(self.pool.as_sqlite().unwrap(), article).await
            }
            DatabaseDriver::Mysql => {
                create_article_mysql(self.pool.as_mysql().unwrap(), article).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self, params: &ArticleListParams) -> Result<PagedResult<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn increment_views(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_views_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => increment_views_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn toggle_like(&self, article_id: i64, user_id: i64) -> Result<LikeToggle> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                toggle_like_sqlite(self.pool.as_sqlite().unwrap(), article_id, user_id).await
            }
            DatabaseDriver::Mysql => {
                toggle_like_mysql(self.pool.as_mysql().unwrap(), article_id, user_id).await
            }
        }
    }

    async fn is_liked(&self, article_id: i64, user_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                is_liked_sqlite(self.pool.as_sqlite().unwrap(), article_id, user_id).await
            }
            DatabaseDriver::Mysql => {
                is_liked_mysql(self.pool.as_mysql().unwrap(), article_id, user_id).await
            }
        }
    }

    async fn liked_ids(&self, user_id: i64, article_ids: &[i64]) -> Result<Vec<i64>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                liked_ids_sqlite(self.pool.as_sqlite().unwrap(), user_id, article_ids).await
            }
            DatabaseDriver::Mysql => {
                liked_ids_mysql(self.pool.as_mysql().unwrap(), user_id, article_ids).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn total_views(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sum_column_sqlite(self.pool.as_sqlite().unwrap(), "views_count").await
            }
            DatabaseDriver::Mysql => {
                sum_column_mysql(self.pool.as_mysql().unwrap(), "views_count").await
            }
        }
    }

    async fn total_likes(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sum_column_sqlite(self.pool.as_sqlite().unwrap(), "likes_count").await
            }
            DatabaseDriver::Mysql => {
                sum_column_mysql(self.pool.as_mysql().unwrap(), "likes_count").await
            }
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, title, content, category, author_name, author_id, created_at, \
                               views_count, likes_count, comments_count";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, content, category, author_name, author_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.category.as_str())
    .bind(&article.author_name)
    .bind(article.author_id)
    .bind(article.created_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    let mut created = article.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_sqlite(pool: &SqlitePool, params: &ArticleListParams) -> Result<PagedResult<Article>> {
    let (rows, total) = match params.category {
        Some(category) => {
            let total: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE category = ?")
                    .bind(category.as_str())
                    .fetch_one(pool)
                    .await
                    .context("Failed to count articles")?;
            let rows = sqlx::query(&format!(
                "SELECT {} FROM articles WHERE category = ? \
                 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(category.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list articles")?;
            (rows, total)
        }
        None => {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
                .fetch_one(pool)
                .await
                .context("Failed to count articles")?;
            let rows = sqlx::query(&format!(
                "SELECT {} FROM articles ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list articles")?;
            (rows, total)
        }
    };

    let mut items = Vec::new();
    for row in &rows {
        items.push(row_to_article_sqlite(row)?);
    }

    Ok(PagedResult {
        items,
        total,
        page: params.page,
        per_page: params.per_page,
    })
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(result.rows_affected() > 0)
}

async fn increment_views_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE articles SET views_count = views_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment view count")?;

    Ok(result.rows_affected() > 0)
}

async fn toggle_like_sqlite(pool: &SqlitePool, article_id: i64, user_id: i64) -> Result<LikeToggle> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let inserted =
        sqlx::query("INSERT OR IGNORE INTO article_likes (article_id, user_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to insert like")?;

    let liked = if inserted.rows_affected() > 0 {
        sqlx::query("UPDATE articles SET likes_count = likes_count + 1 WHERE id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await
            .context("Failed to increment like count")?;
        true
    } else {
        sqlx::query("DELETE FROM article_likes WHERE article_id = ? AND user_id = ?")
            .bind(article_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete like")?;
        sqlx::query("UPDATE articles SET likes_count = MAX(0, likes_count - 1) WHERE id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await
            .context("Failed to decrement like count")?;
        false
    };

    let likes_count: i64 = sqlx::query_scalar("SELECT likes_count FROM articles WHERE id = ?")
        .bind(article_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read like count")?
        .ok_or_else(|| anyhow::anyhow!("Article {} not found", article_id))?;

    tx.commit().await.context("Failed to commit like toggle")?;

    Ok(LikeToggle { liked, likes_count })
}

async fn is_liked_sqlite(pool: &SqlitePool, article_id: i64, user_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM article_likes WHERE article_id = ? AND user_id = ?",
    )
    .bind(article_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to check like")?;

    Ok(count > 0)
}

async fn liked_ids_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    article_ids: &[i64],
) -> Result<Vec<i64>> {
    if article_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; article_ids.len()].join(", ");
    let sql = format!(
        "SELECT article_id FROM article_likes WHERE user_id = ? AND article_id IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(user_id);
    for id in article_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query liked article IDs")?;

    Ok(rows.iter().map(|r| r.get("article_id")).collect())
}

async fn count_sqlite(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;
    Ok(count)
}

async fn sum_column_sqlite(pool: &SqlitePool, column: &str) -> Result<i64> {
    let sum: i64 = sqlx::query_scalar(&format!(
        "SELECT COALESCE(SUM({}), 0) FROM articles",
        column
    ))
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to sum {}", column))?;
    Ok(sum)
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let category_str: String = row.get("category");
    let category = Category::from_str(&category_str)
        .map_err(|_| anyhow!("Invalid category in database: {}", category_str))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        category,
        author_name: row.get("author_name"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        views_count: row.get("views_count"),
        likes_count: row.get("likes_count"),
        comments_count: row.get("comments_count"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, content, category, author_name, author_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.content)
    .bind(article.category.as_str())
    .bind(&article.author_name)
    .bind(article.author_id)
    .bind(article.created_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    let mut created = article.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_mysql(pool: &MySqlPool, params: &ArticleListParams) -> Result<PagedResult<Article>> {
    let (rows, total) = match params.category {
        Some(category) => {
            let total: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE category = ?")
                    .bind(category.as_str())
                    .fetch_one(pool)
                    .await
                    .context("Failed to count articles")?;
            let rows = sqlx::query(&format!(
                "SELECT {} FROM articles WHERE category = ? \
                 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(category.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list articles")?;
            (rows, total)
        }
        None => {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
                .fetch_one(pool)
                .await
                .context("Failed to count articles")?;
            let rows = sqlx::query(&format!(
                "SELECT {} FROM articles ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                ARTICLE_COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list articles")?;
            (rows, total)
        }
    };

    let mut items = Vec::new();
    for row in &rows {
        items.push(row_to_article_mysql(row)?);
    }

    Ok(PagedResult {
        items,
        total,
        page: params.page,
        per_page: params.per_page,
    })
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(result.rows_affected() > 0)
}

async fn increment_views_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE articles SET views_count = views_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment view count")?;

    Ok(result.rows_affected() > 0)
}

async fn toggle_like_mysql(pool: &MySqlPool, article_id: i64, user_id: i64) -> Result<LikeToggle> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let inserted =
        sqlx::query("INSERT IGNORE INTO article_likes (article_id, user_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to insert like")?;

    let liked = if inserted.rows_affected() > 0 {
        sqlx::query("UPDATE articles SET likes_count = likes_count + 1 WHERE id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await
            .context("Failed to increment like count")?;
        true
    } else {
        sqlx::query("DELETE FROM article_likes WHERE article_id = ? AND user_id = ?")
            .bind(article_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete like")?;
        sqlx::query("UPDATE articles SET likes_count = GREATEST(0, likes_count - 1) WHERE id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await
            .context("Failed to decrement like count")?;
        false
    };

    let likes_count: i64 = sqlx::query_scalar("SELECT likes_count FROM articles WHERE id = ?")
        .bind(article_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read like count")?
        .ok_or_else(|| anyhow::anyhow!("Article {} not found", article_id))?;

    tx.commit().await.context("Failed to commit like toggle")?;

    Ok(LikeToggle { liked, likes_count })
}

async fn is_liked_mysql(pool: &MySqlPool, article_id: i64, user_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM article_likes WHERE article_id = ? AND user_id = ?",
    )
    .bind(article_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to check like")?;

    Ok(count > 0)
}

async fn liked_ids_mysql(pool: &MySqlPool, user_id: i64, article_ids: &[i64]) -> Result<Vec<i64>> {
    if article_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; article_ids.len()].join(", ");
    let sql = format!(
        "SELECT article_id FROM article_likes WHERE user_id = ? AND article_id IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(user_id);
    for id in article_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query liked article IDs")?;

    Ok(rows.iter().map(|r| r.get("article_id")).collect())
}

async fn count_mysql(pool: &MySqlPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;
    Ok(count)
}

async fn sum_column_mysql(pool: &MySqlPool, column: &str) -> Result<i64> {
    let sum: i64 = sqlx::query_scalar(&format!(
        "SELECT COALESCE(SUM({}), 0) FROM articles",
        column
    ))
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to sum {}", column))?;
    Ok(sum)
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let category_str: String = row.get("category");
    let category = Category::from_str(&category_str)
        .map_err(|_| anyhow!("Invalid category in database: {}", category_str))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        category,
        author_name: row.get("author_name"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        views_count: row.get("views_count"),
        likes_count: row.get("likes_count"),
        comments_count: row.get("comments_count"),
    })
}
