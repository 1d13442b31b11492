//! Data models
//!
//! This module contains all data structures used throughout the Campusbeat service.
//! Models represent:
//! - Database entities (Article, Comment, ArticleMedia, User, Profile, Session, TrafficEvent)
//! - API request/response types
//! - Internal data transfer objects

mod article;
mod comment;
mod media;
mod profile;
mod session;
mod traffic;
mod user;

pub use article::{
    Article, ArticleListParams, Category, CreateArticleInput, PagedResult,
    MAX_CONTENT_LEN, MAX_TITLE_LEN,
};
pub use comment::{Comment, CreateCommentInput, MAX_COMMENT_LEN};
pub use media::{ArticleMedia, MediaKind};
pub use profile::{AuthorStats, Profile, ProfileView, UpdateProfileInput, MAX_BIO_LEN};
pub use session::Session;
pub use traffic::{PageCount, TrackEventInput, TrafficEvent, TrafficSummary};
pub use user::{User, UserRole};
