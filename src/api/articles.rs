//! Article API endpoints
//!
//! Handles HTTP requests for article management:
//! - GET /api/v1/articles - List articles with pagination
//! - GET /api/v1/articles/{id} - Get article with media and like state
//! - POST /api/v1/articles/{id}/view - Record a view
//! - POST /api/v1/articles - Create new article
//! - POST /api/v1/articles/{id}/like - Toggle like
//! - GET /api/v1/articles/{id}/like - Check like state

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::media::MediaResponse;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Article, ArticleListParams, Category, CreateArticleInput};

/// Query parameters for listing articles
#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by category display name
    pub category: Option<String>,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

/// Response for article list
#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Response for a single article
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub author_name: String,
    pub author_id: Option<i64>,
    pub created_at: String,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    /// Whether the requesting user has liked this article
    pub liked: bool,
}

impl ArticleResponse {
    fn from_article(article: Article, liked: bool) -> Self {
        Self {
            id: article.id,
            title: article.title,
            content: article.content,
            category: article.category,
            author_name: article.author_name,
            author_id: article.author_id,
            created_at: article.created_at.to_rfc3339(),
            views_count: article.views_count,
            likes_count: article.likes_count,
            comments_count: article.comments_count,
            liked,
        }
    }
}

/// Response for a single article with its attached media
#[derive(Debug, Serialize)]
pub struct ArticleDetailResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    pub media: Vec<MediaResponse>,
}

/// Request body for creating an article
#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub category: String,
    pub author_name: Option<String>,
}

/// GET /api/v1/articles - List articles with pagination
///
/// Accepts an optional category filter. When the caller is logged in,
/// each article carries its liked state for that user.
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let mut params = ArticleListParams::new(query.page, query.per_page);
    if let Some(name) = query.category.as_deref() {
        let category = Category::parse(name)
            .ok_or_else(|| ApiError::validation_error(format!("Unknown category: {}", name)))?;
        params = params.with_category(category);
    }

    let result = state.article_service.list(&params).await?;

    let liked = match user {
        Some(Extension(AuthenticatedUser(user))) => {
            let ids: Vec<i64> = result.items.iter().map(|a| a.id).collect();
            state.article_service.liked_ids(user.id, &ids).await?
        }
        None => Vec::new(),
    };

    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();

    let articles = result
        .items
        .into_iter()
        .map(|article| {
            let is_liked = liked.contains(&article.id);
            ArticleResponse::from_article(article, is_liked)
        })
        .collect();

    Ok(Json(ArticleListResponse {
        articles,
        total,
        page,
        per_page,
        total_pages,
    }))
}

/// GET /api/v1/articles/{id} - Get article with media and like state
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<ArticleDetailResponse>, ApiError> {
    let article = state
        .article_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Article not found: {}", id)))?;

    let liked = match user {
        Some(Extension(AuthenticatedUser(user))) => {
            state.article_service.is_liked(id, user.id).await?
        }
        None => false,
    };

    let media = state
        .media_service
        .list_by_article(id)
        .await?
        .into_iter()
        .map(MediaResponse::from)
        .collect();

    Ok(Json(ArticleDetailResponse {
        article: ArticleResponse::from_article(article, liked),
        media,
    }))
}

/// Response for a recorded view
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub id: i64,
    pub views_count: i64,
}

/// POST /api/v1/articles/{id}/view - Record a view
///
/// The increment happens in the database, so concurrent views never
/// lose counts.
pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ViewResponse>, ApiError> {
    let article = state
        .article_service
        .view(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Article not found: {}", id)))?;

    Ok(Json(ViewResponse {
        id: article.id,
        views_count: article.views_count,
    }))
}

/// POST /api/v1/articles - Create new article
///
/// Requires authentication.
pub async fn create_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>), ApiError> {
    let input = CreateArticleInput {
        title: body.title,
        content: body.content,
        category: body.category,
        author_name: body.author_name,
    };

    let article = state.article_service.create(input, Some(user.0.id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ArticleResponse::from_article(article, false)),
    ))
}

/// Response for a like toggle or like check
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: i64,
}

/// POST /api/v1/articles/{id}/like - Toggle like
///
/// Requires authentication. One like per user per article; a second
/// toggle removes it. The response carries the fresh count.
pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let toggle = state.article_service.toggle_like(id, user.0.id).await?;

    Ok(Json(LikeResponse {
        liked: toggle.liked,
        likes_count: toggle.likes_count,
    }))
}

/// GET /api/v1/articles/{id}/like - Check like state
///
/// Requires authentication.
pub async fn check_like(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let article = state
        .article_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Article not found: {}", id)))?;

    let liked = state.article_service.is_liked(id, user.0.id).await?;

    Ok(Json(LikeResponse {
        liked,
        likes_count: article.likes_count,
    }))
}
