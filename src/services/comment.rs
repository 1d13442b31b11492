//! Comment service
//!
//! Validation and authorization around comments. The comment counter on the
//! parent article moves inside the repository transaction, so this layer
//! never touches counts directly.

use crate::db::repositories::{ArticleRepository, CommentRepository, ProfileRepository};
use crate::models::{Comment, CreateCommentInput, User};
use anyhow::Context;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Target article or comment not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Caller is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    article_repo: Arc<dyn ArticleRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
}

impl CommentService {
    pub fn new(
        repo: Arc<dyn CommentRepository>,
        article_repo: Arc<dyn ArticleRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            repo,
            article_repo,
            profile_repo,
        }
    }

    /// Create a comment on an article.
    ///
    /// The display name is snapshotted at posting time: the commenter's
    /// profile full name when set, their username otherwise.
    pub async fn create(
        &self,
        article_id: i64,
        user: &User,
        input: CreateCommentInput,
    ) -> Result<Comment, CommentServiceError> {
        input
            .validate()
            .map_err(CommentServiceError::ValidationError)?;

        if self
            .article_repo
            .get_by_id(article_id)
            .await
            .context("Failed to get article")?
            .is_none()
        {
            return Err(CommentServiceError::NotFound(format!(
                "Article {} not found",
                article_id
            )));
        }

        let author_name = self.display_name(user).await?;

        let comment = self
            .repo
            .create(article_id, user.id, &author_name, input.content.trim())
            .await
            .context("Failed to create comment")?;

        Ok(comment)
    }

    /// List an article's comments, newest first
    pub async fn list_by_article(
        &self,
        article_id: i64,
    ) -> Result<Vec<Comment>, CommentServiceError> {
        let comments = self
            .repo
            .list_by_article(article_id)
            .await
            .context("Failed to list comments")?;

        Ok(comments)
    }

    /// Delete a comment. Only the comment author or an admin may delete.
    pub async fn delete(&self, id: i64, user: &User) -> Result<(), CommentServiceError> {
        let comment = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| CommentServiceError::NotFound(format!("Comment {} not found", id)))?;

        if !user.can_delete(comment.user_id) {
            return Err(CommentServiceError::Forbidden(
                "Only the comment author or an admin can delete this comment".to_string(),
            ));
        }

        self.repo
            .delete(id)
            .await
            .context("Failed to delete comment")?;

        Ok(())
    }

    async fn display_name(&self, user: &User) -> Result<String, CommentServiceError> {
        let profile = self
            .profile_repo
            .get(user.id)
            .await
            .context("Failed to get profile")?;

        let name = profile
            .and_then(|p| p.full_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.username.clone());

        Ok(name)
    }
}
