//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session entity for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a user with the given lifetime
    pub fn new(user_id: i64, expiration_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(expiration_days),
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_not_expired() {
        let session = Session::new(1, 7);
        assert!(!session.is_expired());
        assert_eq!(session.user_id, 1);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::new(1, 7);
        session.expires_at = Utc::now() - Duration::hours(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = Session::new(1, 7);
        let b = Session::new(1, 7);
        assert_ne!(a.id, b.id);
    }
}
