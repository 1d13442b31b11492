//! Rate limiter for login attempts
//!
//! Brute-force protection for the auth endpoints: failed logins are
//! throttled per username and raw request volume per client IP. State is
//! in-memory only and swept periodically by a background task.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Failed attempts allowed per username inside [`USERNAME_WINDOW_MINUTES`]
const MAX_USERNAME_ATTEMPTS: usize = 5;
const USERNAME_WINDOW_MINUTES: i64 = 15;

/// Requests allowed per IP inside [`IP_WINDOW_MINUTES`]
const MAX_IP_REQUESTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

/// Login rate limiter
pub struct LoginRateLimiter {
    /// Failed login attempts by lowercased username
    username_attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    /// Request timestamps by client IP
    ip_attempts: Arc<RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            username_attempts: Arc::new(RwLock::new(HashMap::new())),
            ip_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a username has exhausted its failed-attempt budget
    pub async fn is_username_limited(&self, username: &str) -> bool {
        let mut attempts = self.username_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(USERNAME_WINDOW_MINUTES);

        let entries = attempts.entry(username.to_lowercase()).or_default();
        entries.retain(|time| *time > cutoff);

        entries.len() >= MAX_USERNAME_ATTEMPTS
    }

    /// Record a failed login attempt for a username
    pub async fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Clear failed attempts for a username (on successful login)
    pub async fn clear_username_attempts(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts.remove(&username.to_lowercase());
    }

    /// Check if an IP has exceeded its request budget
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut attempts = self.ip_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);

        let entries = attempts.entry(ip).or_default();
        entries.retain(|time| *time > cutoff);

        entries.len() >= MAX_IP_REQUESTS
    }

    /// Record a request from an IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut attempts = self.ip_attempts.write().await;
        attempts.entry(ip).or_default().push(Utc::now());
    }

    /// Drop expired entries. Called periodically from the background sweep.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let username_cutoff = now - Duration::minutes(USERNAME_WINDOW_MINUTES);
        let ip_cutoff = now - Duration::minutes(IP_WINDOW_MINUTES);

        {
            let mut attempts = self.username_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > username_cutoff);
                !times.is_empty()
            });
        }

        {
            let mut attempts = self.ip_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > ip_cutoff);
                !times.is_empty()
            });
        }
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_username_rate_limit() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            assert!(!limiter.is_username_limited("testuser").await);
            limiter.record_failed_attempt("testuser").await;
        }

        limiter.record_failed_attempt("testuser").await;
        assert!(limiter.is_username_limited("testuser").await);

        limiter.clear_username_attempts("testuser").await;
        assert!(!limiter.is_username_limited("testuser").await);
    }

    #[tokio::test]
    async fn test_ip_rate_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("127.0.0.1").unwrap();

        for _ in 0..9 {
            assert!(!limiter.is_ip_limited(ip).await);
            limiter.record_ip_request(ip).await;
        }

        limiter.record_ip_request(ip).await;
        assert!(limiter.is_ip_limited(ip).await);
    }

    #[tokio::test]
    async fn test_case_insensitive_username() {
        let limiter = LoginRateLimiter::new();

        limiter.record_failed_attempt("TestUser").await;
        limiter.record_failed_attempt("testuser").await;
        limiter.record_failed_attempt("TESTUSER").await;

        assert!(!limiter.is_username_limited("testuser").await);
        limiter.record_failed_attempt("testuser").await;
        limiter.record_failed_attempt("testuser").await;
        assert!(limiter.is_username_limited("TestUser").await);
    }

    #[tokio::test]
    async fn test_cleanup_removes_empty_buckets() {
        let limiter = LoginRateLimiter::new();

        limiter.record_failed_attempt("ghost").await;
        limiter.cleanup().await;

        // Recent attempts survive a sweep
        assert!(!limiter.is_username_limited("ghost").await);
        assert_eq!(limiter.username_attempts.read().await.len(), 1);
    }
}
