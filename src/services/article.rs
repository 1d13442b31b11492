//! Article service
//!
//! Business logic for articles: input validation, cache read-through on the
//! list path, view counting on reads, owner-or-admin delete checks, and
//! realtime publication of newly created articles.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{ArticleRepository, LikeToggle};
use crate::models::{Article, ArticleListParams, CreateArticleInput, PagedResult, User};
use crate::realtime::{EventBus, RealtimeEvent};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for article list pages
const ARTICLE_LIST_CACHE_TTL_SECS: u64 = 60;

/// Cache key prefix for article list pages
const CACHE_KEY_ARTICLE_LIST: &str = "articles:list";

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
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

/// Article service
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    cache: Arc<Cache>,
    bus: Arc<EventBus>,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticleRepository>, cache: Arc<Cache>, bus: Arc<EventBus>) -> Self {
        Self { repo, cache, bus }
    }

    /// Create an article.
    ///
    /// Validation rejects the input before any write: missing title or
    /// content, over-length fields, and unknown categories all fail here.
    /// On success an `ArticleCreated` event is published to live clients.
    pub async fn create(
        &self,
        input: CreateArticleInput,
        author_id: Option<i64>,
    ) -> Result<Article, ArticleServiceError> {
        let category = input
            .validate()
            .map_err(ArticleServiceError::ValidationError)?;

        let article = Article::new(
            input.title.trim().to_string(),
            input.content.clone(),
            category,
            input.display_author(),
            author_id,
        );

        let created = self
            .repo
            .create(&article)
            .await
            .context("Failed to create article")?;

        self.invalidate_list_cache().await;

        self.bus.publish(RealtimeEvent::ArticleCreated {
            id: created.id,
            title: created.title.clone(),
            category: created.category,
        });

        Ok(created)
    }

    /// List articles with pagination and optional category filter.
    ///
    /// List pages are cached briefly; every article mutation invalidates
    /// the whole list keyspace.
    pub async fn list(
        &self,
        params: &ArticleListParams,
    ) -> Result<PagedResult<Article>, ArticleServiceError> {
        let cache_key = list_cache_key(params);
        if let Ok(Some(cached)) = self.cache.get::<PagedResult<Article>>(&cache_key).await {
            return Ok(cached);
        }

        let result = self
            .repo
            .list(params)
            .await
            .context("Failed to list articles")?;

        let _ = self
            .cache
            .set(
                &cache_key,
                &result,
                Duration::from_secs(ARTICLE_LIST_CACHE_TTL_SECS),
            )
            .await;

        Ok(result)
    }

    /// Get an article without side effects
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>, ArticleServiceError> {
        let article = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?;

        Ok(article)
    }

    /// Read an article, counting the view.
    ///
    /// The view counter moves atomically in the database before the row is
    /// read back, so the returned article already reflects this view.
    pub async fn view(&self, id: i64) -> Result<Option<Article>, ArticleServiceError> {
        let exists = self
            .repo
            .increment_views(id)
            .await
            .context("Failed to increment view count")?;

        if !exists {
            return Ok(None);
        }

        let article = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?;

        Ok(article)
    }

    /// Delete an article. Only the author or an admin may delete.
    pub async fn delete(&self, id: i64, user: &User) -> Result<(), ArticleServiceError> {
        let article = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("Article {} not found", id)))?;

        // Anonymous articles have no owner; only admins may remove them
        let allowed = match article.author_id {
            Some(owner_id) => user.can_delete(owner_id),
            None => user.is_admin(),
        };
        if !allowed {
            return Err(ArticleServiceError::Forbidden(
                "Only the author or an admin can delete this article".to_string(),
            ));
        }

        self.repo
            .delete(id)
            .await
            .context("Failed to delete article")?;

        self.invalidate_list_cache().await;

        Ok(())
    }

    /// Toggle the caller's like on an article.
    ///
    /// Returns the new liked state and the resulting like count, both
    /// produced inside a single database transaction.
    pub async fn toggle_like(
        &self,
        article_id: i64,
        user_id: i64,
    ) -> Result<LikeToggle, ArticleServiceError> {
        if self
            .repo
            .get_by_id(article_id)
            .await
            .context("Failed to get article")?
            .is_none()
        {
            return Err(ArticleServiceError::NotFound(format!(
                "Article {} not found",
                article_id
            )));
        }

        let toggle = self
            .repo
            .toggle_like(article_id, user_id)
            .await
            .context("Failed to toggle like")?;

        self.invalidate_list_cache().await;

        Ok(toggle)
    }

    /// Whether the user currently likes the article
    pub async fn is_liked(
        &self,
        article_id: i64,
        user_id: i64,
    ) -> Result<bool, ArticleServiceError> {
        let liked = self
            .repo
            .is_liked(article_id, user_id)
            .await
            .context("Failed to check like state")?;

        Ok(liked)
    }

    /// Which of the given articles has this user liked
    pub async fn liked_ids(
        &self,
        user_id: i64,
        article_ids: &[i64],
    ) -> Result<Vec<i64>, ArticleServiceError> {
        let ids = self
            .repo
            .liked_ids(user_id, article_ids)
            .await
            .context("Failed to load liked article ids")?;

        Ok(ids)
    }

    // Mutations also move the site totals, so the stats entry goes with the lists
    async fn invalidate_list_cache(&self) {
        let _ = self
            .cache
            .delete_pattern(&format!("{}:*", CACHE_KEY_ARTICLE_LIST))
            .await;
        let _ = self
            .cache
            .delete(crate::services::stats::CACHE_KEY_SITE_STATS)
            .await;
    }
}

fn list_cache_key(params: &ArticleListParams) -> String {
    let category = params
        .category
        .map(|c| c.as_str())
        .unwrap_or("all");
    format!(
        "{}:{}:{}:{}",
        CACHE_KEY_ARTICLE_LIST, category, params.page, params.per_page
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::{
        SqlxArticleRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{Category, UserRole};
    use crate::services::password::hash_password;

    struct TestContext {
        pool: DynDatabasePool,
        service: ArticleService,
        bus: Arc<EventBus>,
        member: User,
        admin: User,
    }

    async fn setup() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let admin = users
            .create(&User::new(
                "dean".to_string(),
                "dean@example.com".to_string(),
                hash_password("password123").expect("Failed to hash"),
                UserRole::Admin,
            ))
            .await
            .expect("Failed to create admin");
        let member = users
            .create(&User::new(
                "freshman".to_string(),
                "freshman@example.com".to_string(),
                hash_password("password123").expect("Failed to hash"),
                UserRole::Member,
            ))
            .await
            .expect("Failed to create member");

        let bus = Arc::new(EventBus::new());
        let cache = Arc::new(Cache::Memory(MemoryCache::new()));
        let service = ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            cache,
            bus.clone(),
        );

        TestContext {
            pool,
            service,
            bus,
            member,
            admin,
        }
    }

    fn input(title: &str, category: &str) -> CreateArticleInput {
        CreateArticleInput {
            title: title.to_string(),
            content: "Some campus happenings worth reading about.".to_string(),
            category: category.to_string(),
            author_name: None,
        }
    }

    #[tokio::test]
    async fn test_create_publishes_event() {
        let ctx = setup().await;
        let mut rx = ctx.bus.subscribe();

        let article = ctx
            .service
            .create(input("Dorm room aquarium", "Campus Life"), Some(ctx.member.id))
            .await
            .expect("Failed to create");

        assert_eq!(article.category, Category::CampusLife);
        assert_eq!(article.author_id, Some(ctx.member.id));

        match rx.recv().await.expect("Failed to receive event") {
            RealtimeEvent::ArticleCreated { id, title, category } => {
                assert_eq!(id, article.id);
                assert_eq!(title, "Dorm room aquarium");
                assert_eq!(category, Category::CampusLife);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_unknown_category_rejected_without_write() {
        let ctx = setup().await;

        let result = ctx
            .service
            .create(input("Mystery post", "Gossip"), Some(ctx.member.id))
            .await;
        assert!(matches!(
            result,
            Err(ArticleServiceError::ValidationError(_))
        ));

        let repo = SqlxArticleRepository::new(ctx.pool.clone());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_empty_title_rejected() {
        let ctx = setup().await;

        let result = ctx
            .service
            .create(input("   ", "Campus Life"), Some(ctx.member.id))
            .await;

        assert!(matches!(
            result,
            Err(ArticleServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_view_counts_and_returns_article() {
        let ctx = setup().await;

        let article = ctx
            .service
            .create(input("Exam week memes", "Study Tips"), Some(ctx.member.id))
            .await
            .expect("Failed to create");

        let viewed = ctx
            .service
            .view(article.id)
            .await
            .expect("Failed to view")
            .expect("Article not found");
        assert_eq!(viewed.views_count, 1);

        let viewed_again = ctx
            .service
            .view(article.id)
            .await
            .expect("Failed to view")
            .expect("Article not found");
        assert_eq!(viewed_again.views_count, 2);
    }

    #[tokio::test]
    async fn test_view_missing_article_returns_none() {
        let ctx = setup().await;

        let result = ctx.service.view(404).await.expect("Failed to view");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let ctx = setup().await;

        let article = ctx
            .service
            .create(input("Goodbye post", "Campus Life"), Some(ctx.member.id))
            .await
            .expect("Failed to create");

        ctx.service
            .delete(article.id, &ctx.member)
            .await
            .expect("Owner should be able to delete");

        assert!(ctx
            .service
            .get_by_id(article.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_forbidden() {
        let ctx = setup().await;

        let article = ctx
            .service
            .create(input("Admin only", "Breaking News"), Some(ctx.admin.id))
            .await
            .expect("Failed to create");

        let result = ctx.service.delete(article.id, &ctx.member).await;
        assert!(matches!(result, Err(ArticleServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_can_delete_any_article() {
        let ctx = setup().await;

        let article = ctx
            .service
            .create(input("Member post", "Love Stories"), Some(ctx.member.id))
            .await
            .expect("Failed to create");

        ctx.service
            .delete(article.id, &ctx.admin)
            .await
            .expect("Admin should be able to delete");
    }

    #[tokio::test]
    async fn test_delete_missing_article_not_found() {
        let ctx = setup().await;

        let result = ctx.service.delete(404, &ctx.admin).await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let ctx = setup().await;

        let article = ctx
            .service
            .create(input("Viral post", "Pranks & Fun"), Some(ctx.admin.id))
            .await
            .expect("Failed to create");

        let liked = ctx
            .service
            .toggle_like(article.id, ctx.member.id)
            .await
            .expect("Failed to toggle");
        assert!(liked.liked);
        assert_eq!(liked.likes_count, 1);

        let unliked = ctx
            .service
            .toggle_like(article.id, ctx.member.id)
            .await
            .expect("Failed to toggle");
        assert!(!unliked.liked);
        assert_eq!(unliked.likes_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_like_missing_article() {
        let ctx = setup().await;

        let result = ctx.service.toggle_like(404, ctx.member.id).await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_cache_invalidated_on_create() {
        let ctx = setup().await;
        let params = ArticleListParams::new(1, 10);

        ctx.service
            .create(input("First", "Campus Life"), Some(ctx.member.id))
            .await
            .expect("Failed to create");

        let first = ctx.service.list(&params).await.expect("Failed to list");
        assert_eq!(first.total, 1);

        // A second create must evict the cached page
        ctx.service
            .create(input("Second", "Campus Life"), Some(ctx.member.id))
            .await
            .expect("Failed to create");

        let second = ctx.service.list(&params).await.expect("Failed to list");
        assert_eq!(second.total, 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let ctx = setup().await;

        ctx.service
            .create(input("Life post", "Campus Life"), Some(ctx.member.id))
            .await
            .unwrap();
        ctx.service
            .create(input("Tip post", "Study Tips"), Some(ctx.member.id))
            .await
            .unwrap();

        let params = ArticleListParams::new(1, 10).with_category(Category::StudyTips);
        let result = ctx.service.list(&params).await.expect("Failed to list");

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].title, "Tip post");
    }
}
