//! Session repository
//!
//! Database operations for login sessions. Session IDs are opaque UUID
//! tokens minted by the user service; this layer only stores and sweeps
//! them. Expired rows are removed lazily on validation and in bulk by
//! the background cleanup task.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Look up a session by its token
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Remove a session. Removing an absent session is a no-op.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Remove all sessions past their expiry. Returns rows removed.
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases. The queries here are all
/// single statements, so each trait method dispatches on the driver
/// inline instead of going through per-driver helpers.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_SQL: &str =
    "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)";
const SELECT_SQL: &str = "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?";
const DELETE_SQL: &str = "DELETE FROM sessions WHERE id = ?";
const SWEEP_SQL: &str = "DELETE FROM sessions WHERE expires_at < ?";

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(INSERT_SQL)
                    .bind(&session.id)
                    .bind(session.user_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to create session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(INSERT_SQL)
                    .bind(&session.id)
                    .bind(session.user_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to create session")?;
            }
        }

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(SELECT_SQL)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get session")?;

                row.map(|row| {
                    Ok(Session {
                        id: row.get("id"),
                        user_id: row.get("user_id"),
                        expires_at: row.get("expires_at"),
                        created_at: row.get("created_at"),
                    })
                })
                .transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(SELECT_SQL)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get session")?;

                row.map(|row| {
                    let expires_at: DateTime<Utc> = row.get("expires_at");
                    let created_at: DateTime<Utc> = row.get("created_at");
                    Ok(Session {
                        id: row.get("id"),
                        user_id: row.get("user_id"),
                        expires_at,
                        created_at,
                    })
                })
                .transpose()
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(DELETE_SQL)
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(DELETE_SQL)
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete session")?;
            }
        }

        Ok(())
    }

    async fn delete_expired(&self) -> Result<i64> {
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SWEEP_SQL)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(SWEEP_SQL)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
        };

        Ok(affected as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;
    use uuid::Uuid;

    async fn setup() -> (DynDatabasePool, SqlxSessionRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxSessionRepository::new(pool.clone());
        (pool, repo)
    }

    // Sessions have a user_id foreign key, so tests need a user row
    async fn seed_user(pool: &DynDatabasePool, id: i64) {
        let now = Utc::now();
        let sqlite = pool.as_sqlite().expect("Test pool is sqlite");
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
             VALUES (?, ?, ?, 'hash', 'member', ?, ?)",
        )
        .bind(id)
        .bind(format!("student{}", id))
        .bind(format!("student{}@campus.edu", id))
        .bind(now)
        .bind(now)
        .execute(sqlite)
        .await
        .expect("Failed to seed user");
    }

    fn session_for(user_id: i64, ttl: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (pool, repo) = setup().await;
        seed_user(&pool, 1).await;

        let session = session_for(1, Duration::days(7));
        repo.create(&session).await.expect("Failed to create");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get")
            .expect("Session missing");
        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, 1);
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_get_unknown_token_is_none() {
        let (_pool, repo) = setup().await;

        let found = repo.get_by_id("no-such-token").await.expect("Failed to get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (pool, repo) = setup().await;
        seed_user(&pool, 1).await;

        let session = session_for(1, Duration::days(7));
        repo.create(&session).await.expect("Failed to create");
        repo.delete(&session.id).await.expect("Failed to delete");

        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());

        // Deleting again is a no-op
        repo.delete(&session.id).await.expect("Failed to re-delete");
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_sessions() {
        let (pool, repo) = setup().await;
        seed_user(&pool, 1).await;

        let stale = session_for(1, Duration::days(-1));
        let live = session_for(1, Duration::days(7));
        repo.create(&stale).await.expect("Failed to create stale");
        repo.create(&live).await.expect("Failed to create live");

        let removed = repo.delete_expired().await.expect("Failed to sweep");
        assert_eq!(removed, 1);

        assert!(repo.get_by_id(&stale.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&live.id).await.unwrap().is_some());
    }
}
