//! Database migrations module
//!
//! This module provides code-based database migrations for the Campusbeat
//! service. All migrations are embedded directly in Rust code as SQL strings,
//! supporting both SQLite and MySQL databases for single-binary deployment.
//!
//! # Architecture
//!
//! Each migration is defined as a `Migration` struct containing:
//! - `version`: Unique version number for ordering
//! - `name`: Human-readable migration name
//! - `up_sqlite`: SQL for SQLite database
//! - `up_mysql`: SQL for MySQL database

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the Campusbeat service.
/// These are embedded in the binary for single-binary deployment.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create users table
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'member',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'member',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                INDEX idx_users_username (username),
                INDEX idx_users_email (email)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
    // Migration 2: Create sessions table
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(36) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(36) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                INDEX idx_sessions_user_id (user_id),
                INDEX idx_sessions_expires_at (expires_at)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
    // Migration 3: Create articles table
    //
    // Counters live on the row and only move via atomic
    // UPDATE .. SET x = x + 1 statements; no code path reads a counter
    // and writes it back.
    Migration {
        version: 3,
        name: "create_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                content TEXT NOT NULL,
                category VARCHAR(50) NOT NULL,
                author_name VARCHAR(100) NOT NULL DEFAULT 'Anonymous',
                author_id INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                views_count INTEGER NOT NULL DEFAULT 0,
                likes_count INTEGER NOT NULL DEFAULT 0,
                comments_count INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category);
            CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at);
            CREATE INDEX IF NOT EXISTS idx_articles_author_id ON articles(author_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(200) NOT NULL,
                content TEXT NOT NULL,
                category VARCHAR(50) NOT NULL,
                author_name VARCHAR(100) NOT NULL DEFAULT 'Anonymous',
                author_id BIGINT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                views_count BIGINT NOT NULL DEFAULT 0,
                likes_count BIGINT NOT NULL DEFAULT 0,
                comments_count BIGINT NOT NULL DEFAULT 0,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL,
                INDEX idx_articles_category (category),
                INDEX idx_articles_created_at (created_at),
                INDEX idx_articles_author_id (author_id)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
    // Migration 4: Create article_likes table
    //
    // The UNIQUE constraint is what makes the like toggle idempotent.
    Migration {
        version: 4,
        name: "create_article_likes",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS article_likes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                UNIQUE(article_id, user_id)
            );
            CREATE INDEX IF NOT EXISTS idx_article_likes_user_id ON article_likes(user_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS article_likes (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                article_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                UNIQUE KEY uniq_article_user (article_id, user_id),
                INDEX idx_article_likes_user_id (user_id)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
    // Migration 5: Create comments table
    Migration {
        version: 5,
        name: "create_comments",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                author_name VARCHAR(100) NOT NULL DEFAULT 'Anonymous',
                content TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id);
            CREATE INDEX IF NOT EXISTS idx_comments_user_id ON comments(user_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                article_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                author_name VARCHAR(100) NOT NULL DEFAULT 'Anonymous',
                content TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                INDEX idx_comments_article_id (article_id),
                INDEX idx_comments_user_id (user_id)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
    // Migration 6: Create article_media table
    Migration {
        version: 6,
        name: "create_article_media",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS article_media (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                file_url VARCHAR(500) NOT NULL,
                file_type VARCHAR(10) NOT NULL,
                file_name VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_article_media_article_id ON article_media(article_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS article_media (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                article_id BIGINT NOT NULL,
                file_url VARCHAR(500) NOT NULL,
                file_type VARCHAR(10) NOT NULL,
                file_name VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
                INDEX idx_article_media_article_id (article_id)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
    // Migration 7: Create profiles table
    Migration {
        version: 7,
        name: "create_profiles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id INTEGER PRIMARY KEY,
                full_name VARCHAR(100),
                bio TEXT,
                avatar_url VARCHAR(500),
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id BIGINT PRIMARY KEY,
                full_name VARCHAR(100),
                bio TEXT,
                avatar_url VARCHAR(500),
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
    // Migration 8: Create traffic_events table
    Migration {
        version: 8,
        name: "create_traffic_events",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS traffic_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_path VARCHAR(500) NOT NULL,
                user_agent TEXT,
                referrer VARCHAR(500),
                session_id VARCHAR(100) NOT NULL,
                user_id INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_traffic_events_created_at ON traffic_events(created_at);
            CREATE INDEX IF NOT EXISTS idx_traffic_events_session_id ON traffic_events(session_id);
            CREATE INDEX IF NOT EXISTS idx_traffic_events_page_path ON traffic_events(page_path);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS traffic_events (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                page_path VARCHAR(500) NOT NULL,
                user_agent TEXT,
                referrer VARCHAR(500),
                session_id VARCHAR(100) NOT NULL,
                user_id BIGINT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL,
                INDEX idx_traffic_events_created_at (created_at),
                INDEX idx_traffic_events_session_id (session_id),
                INDEX idx_traffic_events_page_path (page_path)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#,
    },
];

/// Run all pending migrations
///
/// Creates the `_migrations` tracking table if needed, then applies every
/// migration whose version has not yet been recorded. Returns the number
/// of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let sqlite_pool = pool
                .as_sqlite()
                .context("Expected SQLite pool for SQLite driver")?;
            get_applied_migrations_sqlite(sqlite_pool).await
        }
        DatabaseDriver::Mysql => {
            let mysql_pool = pool
                .as_mysql()
                .context("Expected MySQL pool for MySQL driver")?;
            get_applied_migrations_mysql(mysql_pool).await
        }
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to query applied migrations")?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to query applied migrations")?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let sqlite_pool = pool
                .as_sqlite()
                .context("Expected SQLite pool for SQLite driver")?;
            apply_migration_sqlite(sqlite_pool, migration).await
        }
        DatabaseDriver::Mysql => {
            let mysql_pool = pool
                .as_mysql()
                .context("Expected MySQL pool for MySQL driver")?;
            apply_migration_mysql(mysql_pool, migration).await
        }
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // Migration SQL may contain multiple statements
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await
        .context("Failed to record migration")?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    // Migration SQL may contain multiple statements
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await
        .context("Failed to record migration")?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Handle last statement without trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");

        let count = run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_pending_count() {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");

        let pending = pending_count(&pool).await.expect("Failed to check");
        assert_eq!(pending, MIGRATIONS.len());

        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let pending = pending_count(&pool).await.expect("Failed to check");
        assert_eq!(pending, 0);
    }

    #[tokio::test]
    async fn test_articles_table_has_zeroed_counters() {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();
        sqlx::query("INSERT INTO articles (title, content, category) VALUES (?, ?, ?)")
            .bind("Prank Day")
            .bind("Balloons everywhere")
            .bind("Pranks & Fun")
            .execute(sqlite_pool)
            .await
            .expect("Insert should succeed");

        let row = sqlx::query(
            "SELECT views_count, likes_count, comments_count, author_name FROM articles",
        )
        .fetch_one(sqlite_pool)
        .await
        .expect("Select should succeed");
        let views: i64 = row.get("views_count");
        let likes: i64 = row.get("likes_count");
        let author: String = row.get("author_name");
        assert_eq!(views, 0);
        assert_eq!(likes, 0);
        assert_eq!(author, "Anonymous");
    }

    #[tokio::test]
    async fn test_article_likes_unique_constraint() {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash) VALUES ('u', 'u@x.com', 'h')",
        )
        .execute(sqlite_pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO articles (title, content, category) VALUES ('t', 'c', 'Campus Life')",
        )
        .execute(sqlite_pool)
        .await
        .unwrap();

        sqlx::query("INSERT INTO article_likes (article_id, user_id) VALUES (1, 1)")
            .execute(sqlite_pool)
            .await
            .expect("First like should succeed");

        let dup = sqlx::query("INSERT INTO article_likes (article_id, user_id) VALUES (1, 1)")
            .execute(sqlite_pool)
            .await;
        assert!(dup.is_err(), "Duplicate like should be rejected");
    }

    #[tokio::test]
    async fn test_cascade_delete_cleans_dependents() {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash) VALUES ('u', 'u@x.com', 'h')",
        )
        .execute(sqlite_pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO articles (title, content, category) VALUES ('t', 'c', 'Campus Life')",
        )
        .execute(sqlite_pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO article_likes (article_id, user_id) VALUES (1, 1)")
            .execute(sqlite_pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO comments (article_id, user_id, author_name, content) VALUES (1, 1, 'u', 'hi')",
        )
        .execute(sqlite_pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO article_media (article_id, file_url, file_type, file_name) VALUES (1, '/uploads/a.png', 'image', 'a.png')",
        )
        .execute(sqlite_pool)
        .await
        .unwrap();

        sqlx::query("DELETE FROM articles WHERE id = 1")
            .execute(sqlite_pool)
            .await
            .unwrap();

        for table in ["article_likes", "comments", "article_media"] {
            let row = sqlx::query(&format!("SELECT COUNT(*) as c FROM {}", table))
                .fetch_one(sqlite_pool)
                .await
                .unwrap();
            let count: i64 = row.get("c");
            assert_eq!(count, 0, "{} rows should cascade away", table);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n-- comment\nCREATE INDEX i ON a(id);";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("CREATE TABLE"));
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- just a comment"));
        assert!(is_comment_only("-- line one\n-- line two"));
        assert!(!is_comment_only("-- comment\nCREATE TABLE x (id INT)"));
    }

    #[test]
    fn test_migration_versions_are_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, (i + 1) as i32);
        }
    }
}
