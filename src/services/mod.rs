//! Services layer - Business logic
//!
//! This module contains all business logic services for the Campusbeat
//! platform. Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories, cache, and the realtime bus
//! - Handling validation and error cases

pub mod analytics;
pub mod article;
pub mod comment;
pub mod media;
pub mod password;
pub mod profile;
pub mod rate_limiter;
pub mod stats;
pub mod user;

pub use analytics::{AnalyticsService, AnalyticsServiceError};
pub use article::{ArticleService, ArticleServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use media::{MediaService, MediaServiceError};
pub use password::{hash_password, verify_password};
pub use profile::{ProfileService, ProfileServiceError};
pub use rate_limiter::LoginRateLimiter;
pub use stats::{SiteStats, StatsService};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
