//! Comment API endpoints
//!
//! - GET /api/v1/articles/{id}/comments - List an article's comments
//! - POST /api/v1/articles/{id}/comments - Post a comment
//! - DELETE /api/v1/comments/{id} - Delete a comment (author or admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Comment, CreateCommentInput};

/// Response for a single comment
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub article_id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            article_id: comment.article_id,
            user_id: comment.user_id,
            author_name: comment.author_name,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Request body for posting a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// GET /api/v1/articles/{id}/comments - List comments, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let comments = state
        .comment_service
        .list_by_article(article_id)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();

    Ok(Json(comments))
}

/// POST /api/v1/articles/{id}/comments - Post a comment
///
/// Requires authentication. The author name shown on the comment is the
/// commenter's profile name at posting time.
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(article_id): Path<i64>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let input = CreateCommentInput {
        content: body.content,
    };

    let comment = state
        .comment_service
        .create(article_id, &user.0, input)
        .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// DELETE /api/v1/comments/{id} - Delete a comment
///
/// Requires authentication. Only the comment author or an admin may
/// delete; the article's comment count is decremented in the same
/// transaction.
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
