//! Media upload API endpoints
//!
//! - POST /api/v1/articles/{id}/media - Attach uploaded files to an article
//!
//! Accepts multipart/form-data with one or more file fields named "file"
//! or "files". Each file is validated independently; a bad file lands in
//! `failed` without aborting the rest of the batch.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::ArticleMedia;

/// Response for one stored file
#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub id: i64,
    pub article_id: i64,
    pub file_url: String,
    pub file_type: String,
    pub file_name: String,
    pub created_at: String,
}

impl From<ArticleMedia> for MediaResponse {
    fn from(media: ArticleMedia) -> Self {
        Self {
            id: media.id,
            article_id: media.article_id,
            file_url: media.file_url,
            file_type: media.file_type.as_str().to_string(),
            file_name: media.file_name,
            created_at: media.created_at.to_rfc3339(),
        }
    }
}

/// Response for a multi-file upload
#[derive(Debug, Serialize)]
pub struct MultiUploadResponse {
    pub files: Vec<MediaResponse>,
    pub failed: Vec<String>,
}

/// POST /api/v1/articles/{id}/media - Upload media for an article
///
/// Requires authentication.
pub async fn upload_media(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(article_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<MultiUploadResponse>, ApiError> {
    let mut files = Vec::new();
    let mut failed = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "files" && name != "file" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = match field.bytes().await {
            Ok(d) => d,
            Err(e) => {
                failed.push(format!("{}: {}", filename, e));
                continue;
            }
        };

        match state
            .media_service
            .store(article_id, &filename, &content_type, &data)
            .await
        {
            Ok(media) => files.push(media.into()),
            // A missing article fails the whole request, not just one file
            Err(crate::services::MediaServiceError::NotFound(msg)) => {
                return Err(ApiError::not_found(msg));
            }
            Err(e) => failed.push(format!("{}: {}", filename, e)),
        }
    }

    Ok(Json(MultiUploadResponse { files, failed }))
}
