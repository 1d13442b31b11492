//! Profile repository
//!
//! Database operations for user profiles and per-author contribution stats.
//! A profile row is keyed by user ID and written as a whole unit (upsert).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AuthorStats, Profile, ProfileView, UpdateProfileInput};

/// Profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace a user's profile fields as a unit
    async fn upsert(&self, user_id: i64, input: &UpdateProfileInput) -> Result<Profile>;

    /// Get a user's profile row, if any
    async fn get(&self, user_id: i64) -> Result<Option<Profile>>;

    /// Get a user's profile joined with account fields.
    /// Returns None if the user does not exist; profile fields are None
    /// when no profile row has been written yet.
    async fn get_view(&self, user_id: i64) -> Result<Option<ProfileView>>;

    /// Aggregate contribution stats for an author
    async fn author_stats(&self, user_id: i64) -> Result<AuthorStats>;
}

/// SQLx-based profile repository implementation
pub struct SqlxProfileRepository {
    pool: DynDatabasePool,
}

impl SqlxProfileRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProfileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepository {
    async fn upsert(&self, user_id: i64, input: &UpdateProfileInput) -> Result<Profile> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                upsert_sqlite(self.pool.as_sqlite().unwrap(), user_id, input).await
            }
            DatabaseDriver::Mysql => {
                upsert_mysql(self.pool.as_mysql().unwrap(), user_id, input).await
            }
        }
    }

    async fn get(&self, user_id: i64) -> Result<Option<Profile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), user_id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), user_id).await,
        }
    }

    async fn get_view(&self, user_id: i64) -> Result<Option<ProfileView>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_view_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => get_view_mysql(self.pool.as_mysql().unwrap(), user_id).await,
        }
    }

    async fn author_stats(&self, user_id: i64) -> Result<AuthorStats> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                author_stats_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                author_stats_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn upsert_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    input: &UpdateProfileInput,
) -> Result<Profile> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, full_name, bio, avatar_url, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            full_name = excluded.full_name,
            bio = excluded.bio,
            avatar_url = excluded.avatar_url,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(&input.full_name)
    .bind(&input.bio)
    .bind(&input.avatar_url)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert profile")?;

    Ok(Profile {
        user_id,
        full_name: input.full_name.clone(),
        bio: input.bio.clone(),
        avatar_url: input.avatar_url.clone(),
        updated_at: now,
    })
}

async fn get_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<Profile>> {
    let row = sqlx::query(
        "SELECT user_id, full_name, bio, avatar_url, updated_at FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile")?;

    Ok(row.map(|r| Profile {
        user_id: r.get("user_id"),
        full_name: r.get("full_name"),
        bio: r.get("bio"),
        avatar_url: r.get("avatar_url"),
        updated_at: r.get("updated_at"),
    }))
}

async fn get_view_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<ProfileView>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.email, u.created_at, p.full_name, p.bio, p.avatar_url
        FROM users u
        LEFT JOIN profiles p ON p.user_id = u.id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile view")?;

    Ok(row.map(|r| ProfileView {
        user_id: r.get("id"),
        full_name: r.get("full_name"),
        bio: r.get("bio"),
        avatar_url: r.get("avatar_url"),
        email: r.get("email"),
        created_at: r.get("created_at"),
    }))
}

async fn author_stats_sqlite(pool: &SqlitePool, user_id: i64) -> Result<AuthorStats> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as articles_count,
               COALESCE(SUM(views_count), 0) as total_views,
               COALESCE(SUM(likes_count), 0) as total_likes
        FROM articles
        WHERE author_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to aggregate author article stats")?;

    let comments_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count author comments")?;

    Ok(AuthorStats {
        articles_count: row.get("articles_count"),
        comments_count,
        total_views: row.get("total_views"),
        total_likes: row.get("total_likes"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn upsert_mysql(
    pool: &MySqlPool,
    user_id: i64,
    input: &UpdateProfileInput,
) -> Result<Profile> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, full_name, bio, avatar_url, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            full_name = VALUES(full_name),
            bio = VALUES(bio),
            avatar_url = VALUES(avatar_url),
            updated_at = VALUES(updated_at)
        "#,
    )
    .bind(user_id)
    .bind(&input.full_name)
    .bind(&input.bio)
    .bind(&input.avatar_url)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert profile")?;

    Ok(Profile {
        user_id,
        full_name: input.full_name.clone(),
        bio: input.bio.clone(),
        avatar_url: input.avatar_url.clone(),
        updated_at: now,
    })
}

async fn get_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<Profile>> {
    let row = sqlx::query(
        "SELECT user_id, full_name, bio, avatar_url, updated_at FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile")?;

    Ok(row.map(|r| Profile {
        user_id: r.get("user_id"),
        full_name: r.get("full_name"),
        bio: r.get("bio"),
        avatar_url: r.get("avatar_url"),
        updated_at: r.get("updated_at"),
    }))
}

async fn get_view_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<ProfileView>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.email, u.created_at, p.full_name, p.bio, p.avatar_url
        FROM users u
        LEFT JOIN profiles p ON p.user_id = u.id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile view")?;

    Ok(row.map(|r| ProfileView {
        user_id: r.get("id"),
        full_name: r.get("full_name"),
        bio: r.get("bio"),
        avatar_url: r.get("avatar_url"),
        email: r.get("email"),
        created_at: r.get("created_at"),
    }))
}

async fn author_stats_mysql(pool: &MySqlPool, user_id: i64) -> Result<AuthorStats> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as articles_count,
               COALESCE(SUM(views_count), 0) as total_views,
               COALESCE(SUM(likes_count), 0) as total_likes
        FROM articles
        WHERE author_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to aggregate author article stats")?;

    let comments_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count author comments")?;

    Ok(AuthorStats {
        articles_count: row.get("articles_count"),
        comments_count,
        total_views: row.get("total_views"),
        total_likes: row.get("total_likes"),
    })
}
