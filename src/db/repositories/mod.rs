//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod article;
pub mod comment;
pub mod media;
pub mod profile;
pub mod session;
pub mod traffic;
pub mod user;

pub use article::{ArticleRepository, LikeToggle, SqlxArticleRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use media::{MediaRepository, SqlxMediaRepository};
pub use profile::{ProfileRepository, SqlxProfileRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use traffic::{SqlxTrafficRepository, TrafficRepository};
pub use user::{SqlxUserRepository, UserRepository};
