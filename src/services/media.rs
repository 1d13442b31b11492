//! Media service
//!
//! Stores uploaded article attachments on disk and records them in the
//! database. Files land under the configured upload directory with UUID
//! names; the public URL is `/uploads/{stored_name}`. A database row is
//! only written once the file is safely on disk.

use crate::config::UploadConfig;
use crate::db::repositories::{ArticleRepository, MediaRepository};
use crate::models::{ArticleMedia, MediaKind};
use anyhow::Context;
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

/// Error types for media service operations
#[derive(Debug, thiserror::Error)]
pub enum MediaServiceError {
    /// Target article not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (type or size)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Media service
pub struct MediaService {
    repo: Arc<dyn MediaRepository>,
    article_repo: Arc<dyn ArticleRepository>,
    config: Arc<UploadConfig>,
}

impl MediaService {
    pub fn new(
        repo: Arc<dyn MediaRepository>,
        article_repo: Arc<dyn ArticleRepository>,
        config: Arc<UploadConfig>,
    ) -> Self {
        Self {
            repo,
            article_repo,
            config,
        }
    }

    /// Validate, persist, and record one uploaded file.
    ///
    /// The MIME type decides the media kind (image or video) against the
    /// configured allow-lists; anything else is rejected before disk IO.
    pub async fn store(
        &self,
        article_id: i64,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<ArticleMedia, MediaServiceError> {
        if self
            .article_repo
            .get_by_id(article_id)
            .await
            .context("Failed to get article")?
            .is_none()
        {
            return Err(MediaServiceError::NotFound(format!(
                "Article {} not found",
                article_id
            )));
        }

        let kind = if self.config.is_image(content_type) {
            MediaKind::Image
        } else if self.config.is_video(content_type) {
            MediaKind::Video
        } else {
            return Err(MediaServiceError::ValidationError(format!(
                "Unsupported file type: {}",
                content_type
            )));
        };

        if data.len() as u64 > self.config.max_file_size {
            return Err(MediaServiceError::ValidationError(format!(
                "File too large (max {} MB)",
                self.config.max_file_size / 1024 / 1024
            )));
        }

        if !self.config.path.exists() {
            fs::create_dir_all(&self.config.path)
                .await
                .context("Failed to create upload directory")?;
        }

        let stored_name = format!(
            "{}.{}",
            Uuid::new_v4(),
            self.config.get_extension(content_type)
        );
        let file_path = self.config.path.join(&stored_name);

        fs::write(&file_path, data)
            .await
            .context("Failed to save uploaded file")?;

        let url = format!("/uploads/{}", stored_name);

        let media = self
            .repo
            .create(article_id, &url, kind, original_name)
            .await
            .context("Failed to record uploaded file")?;

        Ok(media)
    }

    /// List an article's media rows, oldest first
    pub async fn list_by_article(
        &self,
        article_id: i64,
    ) -> Result<Vec<ArticleMedia>, MediaServiceError> {
        let media = self
            .repo
            .list_by_article(article_id)
            .await
            .context("Failed to list media")?;

        Ok(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArticleRepository, SqlxMediaRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Article, Category};
    use tempfile::TempDir;

    struct TestContext {
        // Held so the upload directory outlives the test body
        _dir: TempDir,
        service: MediaService,
        article_id: i64,
        upload_path: std::path::PathBuf,
    }

    async fn setup() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let articles = SqlxArticleRepository::new(pool.clone());
        let article = articles
            .create(&Article::new(
                "Homecoming photo dump".to_string(),
                "Pictures from the weekend.".to_string(),
                Category::CampusLife,
                "Anonymous".to_string(),
                None,
            ))
            .await
            .expect("Failed to create article");

        let dir = TempDir::new().expect("Failed to create temp dir");
        let upload_path = dir.path().to_path_buf();
        let config = Arc::new(UploadConfig {
            path: upload_path.clone(),
            max_file_size: 1024,
            ..UploadConfig::default()
        });

        let service = MediaService::new(
            SqlxMediaRepository::boxed(pool.clone()),
            SqlxArticleRepository::boxed(pool.clone()),
            config,
        );

        TestContext {
            _dir: dir,
            service,
            article_id: article.id,
            upload_path,
        }
    }

    #[tokio::test]
    async fn test_store_image() {
        let ctx = setup().await;

        let media = ctx
            .service
            .store(ctx.article_id, "party.jpg", "image/jpeg", b"jpegdata")
            .await
            .expect("Failed to store");

        assert_eq!(media.file_type, MediaKind::Image);
        assert_eq!(media.file_name, "party.jpg");
        assert!(media.file_url.starts_with("/uploads/"));
        assert!(media.file_url.ends_with(".jpg"));

        // The bytes must be on disk under the stored name
        let stored_name = media.file_url.trim_start_matches("/uploads/");
        let on_disk = tokio::fs::read(ctx.upload_path.join(stored_name))
            .await
            .expect("Stored file missing");
        assert_eq!(on_disk, b"jpegdata");
    }

    #[tokio::test]
    async fn test_store_video() {
        let ctx = setup().await;

        let media = ctx
            .service
            .store(ctx.article_id, "clip.mp4", "video/mp4", b"mp4data")
            .await
            .expect("Failed to store");

        assert_eq!(media.file_type, MediaKind::Video);
        assert!(media.file_url.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_store_rejects_disallowed_type() {
        let ctx = setup().await;

        let result = ctx
            .service
            .store(ctx.article_id, "notes.pdf", "application/pdf", b"pdf")
            .await;

        assert!(matches!(result, Err(MediaServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_file() {
        let ctx = setup().await;

        let big = vec![0u8; 2048];
        let result = ctx
            .service
            .store(ctx.article_id, "huge.png", "image/png", &big)
            .await;

        assert!(matches!(result, Err(MediaServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_store_missing_article() {
        let ctx = setup().await;

        let result = ctx
            .service
            .store(404, "photo.png", "image/png", b"png")
            .await;

        assert!(matches!(result, Err(MediaServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_article() {
        let ctx = setup().await;

        ctx.service
            .store(ctx.article_id, "a.png", "image/png", b"a")
            .await
            .unwrap();
        ctx.service
            .store(ctx.article_id, "b.mp4", "video/mp4", b"b")
            .await
            .unwrap();

        let media = ctx
            .service
            .list_by_article(ctx.article_id)
            .await
            .expect("Failed to list");

        assert_eq!(media.len(), 2);
        assert_eq!(media[0].file_name, "a.png");
        assert_eq!(media[1].file_name, "b.mp4");
    }
}
