//! Comment repository
//!
//! Database operations for article comments. Creating or deleting a comment
//! moves the article's `comments_count` in the same transaction so the
//! counter always matches the row count.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Comment;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment and bump the article's comment counter
    async fn create(
        &self,
        article_id: i64,
        user_id: i64,
        author_name: &str,
        content: &str,
    ) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Get comments for an article, newest first
    async fn list_by_article(&self, article_id: i64) -> Result<Vec<Comment>>;

    /// Delete a comment and decrement the article's comment counter.
    /// Returns false if the comment did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(
        &self,
        article_id: i64,
        user_id: i64,
        author_name: &str,
        content: &str,
    ) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    article_id,
                    user_id,
                    author_name,
                    content,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                create_mysql(
                    self.pool.as_mysql().unwrap(),
                    article_id,
                    user_id,
                    author_name,
                    content,
                )
                .await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_by_article(&self, article_id: i64) -> Result<Vec<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_article_sqlite(self.pool.as_sqlite().unwrap(), article_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_article_mysql(self.pool.as_mysql().unwrap(), article_id).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(
    pool: &SqlitePool,
    article_id: i64,
    user_id: i64,
    author_name: &str,
    content: &str,
) -> Result<Comment> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO comments (article_id, user_id, author_name, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(article_id)
    .bind(user_id)
    .bind(author_name)
    .bind(content)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create comment")?;

    let id = result.last_insert_rowid();

    sqlx::query("UPDATE articles SET comments_count = comments_count + 1 WHERE id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .context("Failed to increment comment count")?;

    tx.commit().await.context("Failed to commit comment")?;

    Ok(Comment {
        id,
        article_id,
        user_id,
        author_name: author_name.to_string(),
        content: content.to_string(),
        created_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, article_id, user_id, author_name, content, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|r| row_to_comment_sqlite(&r)))
}

async fn list_by_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, article_id, user_id, author_name, content, created_at
        FROM comments
        WHERE article_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    Ok(rows.iter().map(|r| row_to_comment_sqlite(r)).collect())
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query("SELECT article_id FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to look up comment")?;

    let Some(row) = row else {
        return Ok(false);
    };
    let article_id: i64 = row.get("article_id");

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete comment")?;

    sqlx::query("UPDATE articles SET comments_count = MAX(0, comments_count - 1) WHERE id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .context("Failed to decrement comment count")?;

    tx.commit().await.context("Failed to commit delete")?;

    Ok(true)
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        article_id: row.get("article_id"),
        user_id: row.get("user_id"),
        author_name: row.get("author_name"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(
    pool: &MySqlPool,
    article_id: i64,
    user_id: i64,
    author_name: &str,
    content: &str,
) -> Result<Comment> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO comments (article_id, user_id, author_name, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(article_id)
    .bind(user_id)
    .bind(author_name)
    .bind(content)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create comment")?;

    let id = result.last_insert_id() as i64;

    sqlx::query("UPDATE articles SET comments_count = comments_count + 1 WHERE id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .context("Failed to increment comment count")?;

    tx.commit().await.context("Failed to commit comment")?;

    Ok(Comment {
        id,
        article_id,
        user_id,
        author_name: author_name.to_string(),
        content: content.to_string(),
        created_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, article_id, user_id, author_name, content, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|r| row_to_comment_mysql(&r)))
}

async fn list_by_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, article_id, user_id, author_name, content, created_at
        FROM comments
        WHERE article_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    Ok(rows.iter().map(|r| row_to_comment_mysql(r)).collect())
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query("SELECT article_id FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to look up comment")?;

    let Some(row) = row else {
        return Ok(false);
    };
    let article_id: i64 = row.get("article_id");

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete comment")?;

    sqlx::query(
        "UPDATE articles SET comments_count = GREATEST(0, comments_count - 1) WHERE id = ?",
    )
    .bind(article_id)
    .execute(&mut *tx)
    .await
    .context("Failed to decrement comment count")?;

    tx.commit().await.context("Failed to commit delete")?;

    Ok(true)
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        article_id: row.get("article_id"),
        user_id: row.get("user_id"),
        author_name: row.get("author_name"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::article::{ArticleRepository, SqlxArticleRepository};
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Article, Category, User, UserRole};

    struct TestContext {
        pool: DynDatabasePool,
        comments: SqlxCommentRepository,
        articles: SqlxArticleRepository,
        user_id: i64,
        article_id: i64,
    }

    async fn setup() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new(
                "commenter".to_string(),
                "commenter@example.com".to_string(),
                "hash".to_string(),
                UserRole::Member,
            ))
            .await
            .expect("Failed to create user");

        let articles = SqlxArticleRepository::new(pool.clone());
        let article = articles
            .create(&Article::new(
                "Commented".to_string(),
                "Content".to_string(),
                Category::CampusLife,
                "Anonymous".to_string(),
                None,
            ))
            .await
            .expect("Failed to create article");

        TestContext {
            comments: SqlxCommentRepository::new(pool.clone()),
            articles,
            user_id: user.id,
            article_id: article.id,
            pool,
        }
    }

    #[tokio::test]
    async fn test_create_comment_bumps_counter() {
        let ctx = setup().await;

        let comment = ctx
            .comments
            .create(ctx.article_id, ctx.user_id, "commenter", "First!")
            .await
            .expect("Failed to create comment");

        assert!(comment.id > 0);
        assert_eq!(comment.content, "First!");

        let article = ctx
            .articles
            .get_by_id(ctx.article_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(article.comments_count, 1);
    }

    #[tokio::test]
    async fn test_list_comments_newest_first() {
        let ctx = setup().await;

        let first = ctx
            .comments
            .create(ctx.article_id, ctx.user_id, "commenter", "one")
            .await
            .unwrap();
        let second = ctx
            .comments
            .create(ctx.article_id, ctx.user_id, "commenter", "two")
            .await
            .unwrap();

        let comments = ctx
            .comments
            .list_by_article(ctx.article_id)
            .await
            .expect("Failed to list");
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, second.id);
        assert_eq!(comments[1].id, first.id);
    }

    #[tokio::test]
    async fn test_delete_comment_decrements_counter() {
        let ctx = setup().await;

        let comment = ctx
            .comments
            .create(ctx.article_id, ctx.user_id, "commenter", "oops")
            .await
            .unwrap();

        assert!(ctx.comments.delete(comment.id).await.expect("Failed"));
        assert!(!ctx.comments.delete(comment.id).await.expect("Failed"));

        let article = ctx
            .articles
            .get_by_id(ctx.article_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(article.comments_count, 0);
    }

    #[tokio::test]
    async fn test_comments_cascade_with_article() {
        let ctx = setup().await;

        ctx.comments
            .create(ctx.article_id, ctx.user_id, "commenter", "bye")
            .await
            .unwrap();

        ctx.articles.delete(ctx.article_id).await.unwrap();

        let remaining = ctx.comments.list_by_article(ctx.article_id).await.unwrap();
        assert!(remaining.is_empty());
        let _ = &ctx.pool;
    }
}
