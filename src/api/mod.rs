//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Campusbeat
//! platform. It includes:
//! - Article API endpoints (list, read, create, view, like)
//! - Comment API endpoints
//! - Media upload API endpoints
//! - User/Auth API endpoints
//! - Profile API endpoints
//! - Admin API endpoints
//! - Traffic analytics ingest
//! - Realtime SSE stream and live stats

pub mod admin;
pub mod analytics;
pub mod articles;
pub mod auth;
pub mod comments;
pub mod events;
pub mod media;
pub mod middleware;
pub mod profiles;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route("/articles", post(articles::create_article))
        .route("/articles/{id}/media", post(media::upload_media))
        .route(
            "/articles/{id}/like",
            post(articles::toggle_like).get(articles::check_like),
        )
        .route("/articles/{id}/comments", post(comments::create_comment))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route(
            "/profile",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route("/profile/stats", get(profiles::get_profile_stats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public reads that personalize output when a session is present
    let personalized_routes = Router::new()
        .route("/articles", get(articles::list_articles))
        .route("/articles/{id}", get(articles::get_article))
        .route("/analytics/track", post(analytics::track))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    // Public routes
    Router::new()
        .route("/articles/{id}/view", post(articles::record_view))
        .route("/articles/{id}/comments", get(comments::list_comments))
        .route("/stats/live", get(events::live_stats))
        .route("/events", get(events::events))
        .nest("/auth", auth::public_router())
        .merge(personalized_routes)
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS must allow credentials for cookie-based auth
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173")),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let uploads_dir = state.upload_config.path.clone();

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Uploaded media is served straight from disk
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    use crate::cache::create_cache;
    use crate::config::{CacheConfig, RealtimeConfig, UploadConfig};
    use crate::db::repositories::{
        SqlxArticleRepository, SqlxCommentRepository, SqlxMediaRepository, SqlxProfileRepository,
        SqlxSessionRepository, SqlxTrafficRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::realtime::{EventBus, PresenceRegistry};
    use crate::services::{
        AnalyticsService, ArticleService, CommentService, LoginRateLimiter, MediaService,
        ProfileService, StatsService, UserService,
    };

    async fn setup_server() -> (TestServer, tempfile::TempDir) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let upload_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let upload_config = Arc::new(UploadConfig {
            path: upload_dir.path().to_path_buf(),
            ..UploadConfig::default()
        });

        let cache = create_cache(&CacheConfig::default());
        let bus = Arc::new(EventBus::new());
        let presence = Arc::new(PresenceRegistry::new(bus.clone()));

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let media_repo = SqlxMediaRepository::boxed(pool.clone());
        let profile_repo = SqlxProfileRepository::boxed(pool.clone());
        let traffic_repo = SqlxTrafficRepository::boxed(pool.clone());

        let state = AppState {
            user_service: Arc::new(UserService::new(user_repo.clone(), session_repo)),
            article_service: Arc::new(ArticleService::new(
                article_repo.clone(),
                cache.clone(),
                bus.clone(),
            )),
            comment_service: Arc::new(CommentService::new(
                comment_repo,
                article_repo.clone(),
                profile_repo.clone(),
            )),
            media_service: Arc::new(MediaService::new(
                media_repo,
                article_repo.clone(),
                upload_config.clone(),
            )),
            profile_service: Arc::new(ProfileService::new(profile_repo)),
            analytics_service: Arc::new(AnalyticsService::new(traffic_repo)),
            stats_service: Arc::new(StatsService::new(article_repo, user_repo, cache)),
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            bus,
            presence,
            upload_config,
            realtime_config: Arc::new(RealtimeConfig::default()),
            session_expiration_days: 7,
        };

        let server = TestServer::new(build_router(state, "http://localhost:5173"))
            .expect("Failed to start test server");
        (server, upload_dir)
    }

    async fn register(server: &TestServer, username: &str) -> String {
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": username,
                "email": format!("{}@campus.edu", username),
                "password": "password123",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    fn bearer(token: &str) -> (axum::http::HeaderName, axum::http::HeaderValue) {
        (
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", token).parse().expect("Invalid header"),
        )
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let (server, _dir) = setup_server().await;
        let token = register(&server, "firstuser").await;

        let (name, value) = bearer(&token);
        let response = server.get("/api/v1/auth/me").add_header(name, value).await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["username"], "firstuser");
        // First registered account is the admin
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_create_article_requires_auth() {
        let (server, _dir) = setup_server().await;

        let response = server
            .post("/api/v1/articles")
            .json(&json!({
                "title": "No session",
                "content": "Should be rejected",
                "category": "Campus Life",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_article_lifecycle_over_http() {
        let (server, _dir) = setup_server().await;
        let token = register(&server, "writer").await;

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/v1/articles")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "title": "Midnight library lock-in",
                "content": "It really happened.",
                "category": "Campus Life",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let article_id = response.json::<Value>()["id"].as_i64().expect("Missing id");

        // Anonymous list sees the article with liked = false
        let response = server.get("/api/v1/articles").await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["total"], 1);
        assert_eq!(body["articles"][0]["liked"], false);

        // View bumps the counter
        let response = server
            .post(&format!("/api/v1/articles/{}/view", article_id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["views_count"], 1);

        // Like toggles on, and the list reflects it for the liker
        let response = server
            .post(&format!("/api/v1/articles/{}/like", article_id))
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["liked"], true);
        assert_eq!(body["likes_count"], 1);

        let response = server
            .get("/api/v1/articles")
            .add_header(name, value)
            .await;
        assert_eq!(response.json::<Value>()["articles"][0]["liked"], true);
    }

    #[tokio::test]
    async fn test_comment_round_trip() {
        let (server, _dir) = setup_server().await;
        let token = register(&server, "commenter").await;
        let (name, value) = bearer(&token);

        let response = server
            .post("/api/v1/articles")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "title": "Exam week survival",
                "content": "Coffee.",
                "category": "Study Tips",
            }))
            .await;
        let article_id = response.json::<Value>()["id"].as_i64().expect("Missing id");

        let response = server
            .post(&format!("/api/v1/articles/{}/comments", article_id))
            .add_header(name, value)
            .json(&json!({ "content": "Good luck everyone" }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["author_name"], "commenter");

        let response = server
            .get(&format!("/api/v1/articles/{}/comments", article_id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>().as_array().map(|a| a.len()), Some(1));
    }

    #[tokio::test]
    async fn test_admin_routes_forbidden_for_members() {
        let (server, _dir) = setup_server().await;
        // First user is admin; second is a member
        register(&server, "admin").await;
        let member_token = register(&server, "member").await;

        let (name, value) = bearer(&member_token);
        let response = server
            .get("/api/v1/admin/stats")
            .add_header(name, value)
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_live_stats_public() {
        let (server, _dir) = setup_server().await;

        let response = server.get("/api/v1/stats/live").await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["online"], 0);
        assert_eq!(body["total_articles"], 0);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let (server, _dir) = setup_server().await;

        let response = server.get("/api/v1/articles?category=Nonsense").await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"]["code"],
            "VALIDATION_ERROR"
        );
    }
}
