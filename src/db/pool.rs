//! Database connection pool
//!
//! One handle over a SQLite or MySQL pool, picked at startup from
//! configuration. Repositories branch on `driver()` and reach the
//! concrete pool through `as_sqlite()`/`as_mysql()` for their
//! per-driver queries.

use anyhow::{Context, Result};
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_MAX_CONNECTIONS: u32 = 20;
const MYSQL_MAX_CONNECTIONS: u32 = 30;

/// Shared handle to the active pool
pub type DynDatabasePool = Arc<DatabasePool>;

/// The active database backend.
///
/// Like the cache handle, this is an enum rather than a trait object:
/// the per-driver repository functions need the concrete sqlx pool
/// types, so dynamic dispatch buys nothing here.
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Sqlite(SqlitePool),
    Mysql(MySqlPool),
}

impl DatabasePool {
    /// Open a SQLite pool.
    ///
    /// Accepts a bare file path, a `sqlite:` URL, or `:memory:`. File
    /// databases are created on first connect, along with any missing
    /// parent directories.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        let in_memory = url == ":memory:" || url == "sqlite::memory:";

        if !in_memory {
            let path = url.strip_prefix("sqlite:").unwrap_or(url);
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
        }

        let connection_url = match url {
            ":memory:" => "sqlite::memory:".to_string(),
            u if u.starts_with("sqlite:") && u.contains('?') => u.to_string(),
            u if u.starts_with("sqlite:") => format!("{}?mode=rwc", u),
            u => format!("sqlite:{}?mode=rwc", u),
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        // Cascade deletes rely on this
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self::Sqlite(pool))
    }

    /// Open a MySQL pool. A missing `mysql://` scheme is added.
    pub async fn connect_mysql(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self::Mysql(pool))
    }

    pub fn driver(&self) -> DatabaseDriver {
        match self {
            Self::Sqlite(_) => DatabaseDriver::Sqlite,
            Self::Mysql(_) => DatabaseDriver::Mysql,
        }
    }

    pub fn as_sqlite(&self) -> Option<&SqlitePool> {
        match self {
            Self::Sqlite(pool) => Some(pool),
            Self::Mysql(_) => None,
        }
    }

    pub fn as_mysql(&self) -> Option<&MySqlPool> {
        match self {
            Self::Sqlite(_) => None,
            Self::Mysql(pool) => Some(pool),
        }
    }

    /// Run a statement that returns no rows. Used by the migration
    /// runner, which executes whole DDL scripts.
    pub async fn execute(&self, query: &str) -> Result<u64> {
        let affected = match self {
            Self::Sqlite(pool) => {
                sqlx::query(query)
                    .execute(pool)
                    .await
                    .with_context(|| format!("Failed to execute query: {}", query))?
                    .rows_affected()
            }
            Self::Mysql(pool) => {
                sqlx::query(query)
                    .execute(pool)
                    .await
                    .with_context(|| format!("Failed to execute query: {}", query))?
                    .rows_affected()
            }
        };
        Ok(affected)
    }

    /// Round-trip a trivial query to confirm the connection works
    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Sqlite(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(pool)
                    .await
                    .context("Database ping failed")?;
            }
            Self::Mysql(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(pool)
                    .await
                    .context("Database ping failed")?;
            }
        }
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        match self {
            Self::Sqlite(pool) => pool.close().await,
            Self::Mysql(pool) => pool.close().await,
        }
    }
}

/// Open the pool named by the configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let pool = match config.driver {
        DatabaseDriver::Sqlite => DatabasePool::connect_sqlite(&config.url).await?,
        DatabaseDriver::Mysql => DatabasePool::connect_mysql(&config.url).await?,
    };
    Ok(Arc::new(pool))
}

/// In-memory SQLite pool for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    Ok(Arc::new(DatabasePool::connect_sqlite(":memory:").await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_pool_creation() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.as_sqlite().is_some());
        assert!(pool.as_mysql().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_pool_ping_and_execute() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");
        let affected = pool
            .execute("INSERT INTO t (name) VALUES ('x')")
            .await
            .expect("Failed to insert");
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_sqlite_file_pool_creates_nested_dirs() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_pool_close() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        pool.close().await;
    }

    // MySQL tests require a running server; set MYSQL_TEST_URL to run them.
    #[tokio::test]
    #[ignore = "Requires MySQL server"]
    async fn test_mysql_pool_creation() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());

        let config = DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        assert!(pool.as_mysql().is_some());
        pool.ping().await.expect("Ping should succeed");
    }
}
