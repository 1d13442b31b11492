//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token validation)
//! - Authorization (admin checking)
//! - The shared application state and the API error envelope

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{RealtimeConfig, UploadConfig};
use crate::models::{User, UserRole};
use crate::realtime::{EventBus, PresenceRegistry};
use crate::services::{
    AnalyticsService, AnalyticsServiceError, ArticleService, ArticleServiceError, CommentService,
    CommentServiceError, LoginRateLimiter, MediaService, MediaServiceError, ProfileService,
    ProfileServiceError, StatsService, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub article_service: Arc<ArticleService>,
    pub comment_service: Arc<CommentService>,
    pub media_service: Arc<MediaService>,
    pub profile_service: Arc<ProfileService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub stats_service: Arc<StatsService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub bus: Arc<EventBus>,
    pub presence: Arc<PresenceRegistry>,
    pub upload_config: Arc<UploadConfig>,
    pub realtime_config: Arc<RealtimeConfig>,
    /// Session lifetime, used for the cookie Max-Age
    pub session_expiration_days: i64,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(e: ArticleServiceError) -> Self {
        match e {
            ArticleServiceError::NotFound(msg) => ApiError::not_found(msg),
            ArticleServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ArticleServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ArticleServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound(msg) => ApiError::not_found(msg),
            CommentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CommentServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            CommentServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<MediaServiceError> for ApiError {
    fn from(e: MediaServiceError) -> Self {
        match e {
            MediaServiceError::NotFound(msg) => ApiError::not_found(msg),
            MediaServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            MediaServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<ProfileServiceError> for ApiError {
    fn from(e: ProfileServiceError) -> Self {
        match e {
            ProfileServiceError::NotFound(msg) => ApiError::not_found(msg),
            ProfileServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ProfileServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<AnalyticsServiceError> for ApiError {
    fn from(e: AnalyticsServiceError) -> Self {
        match e {
            AnalyticsServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AnalyticsServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(msg) => {
                ApiError::with_details("CONFLICT", msg, serde_json::json!({}))
            }
            UserServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

/// Extract session token from request
pub fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session validation failed: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Attaches the user when a valid session token is present but never
/// rejects the request. Used on public reads that personalize output
/// (liked state on article lists).
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(&request) {
        if let Ok(Some(user)) = state.user_service.validate_session(&token).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}

// Extractor for AuthenticatedUser from request extensions
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.0.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn create_request_with_auth(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn create_request_with_cookie(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, format!("session={}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let request = create_request_with_auth("test-token-123");
        assert_eq!(
            extract_session_token(&request),
            Some("test-token-123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let request = create_request_with_cookie("test-token-456");
        assert_eq!(
            extract_session_token(&request),
            Some("test-token-456".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "session=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(&request),
            Some("bearer-token".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_extract_session_token_invalid_bearer() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Basic invalid")
            .body(Body::empty())
            .unwrap();
        assert!(extract_session_token(&request).is_none());
    }

    #[tokio::test]
    async fn test_authenticated_user_extractor() {
        use axum::extract::FromRequestParts;

        let mut user = User::new(
            "reader".to_string(),
            "reader@example.com".to_string(),
            "hash".to_string(),
            UserRole::Member,
        );
        user.id = 42;

        let (mut parts, _body) = Request::builder()
            .uri("/test")
            .extension(AuthenticatedUser(user))
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let extracted = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .expect("Extension should yield the user");
        assert_eq!(extracted.0.id, 42);

        let (mut bare_parts, _body) = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let rejection = AuthenticatedUser::from_request_parts(&mut bare_parts, &())
            .await
            .expect_err("Missing extension should reject");
        assert_eq!(rejection.error.code, "UNAUTHORIZED");
    }

    #[test]
    fn test_api_error_unauthorized() {
        let error = ApiError::unauthorized("Test message");
        assert_eq!(error.error.code, "UNAUTHORIZED");
    }

    #[test]
    fn test_api_error_forbidden() {
        let error = ApiError::forbidden("Access denied");
        assert_eq!(error.error.code, "FORBIDDEN");
    }

    #[test]
    fn test_api_error_with_details() {
        let details = serde_json::json!({"field": "username"});
        let error = ApiError::with_details("VALIDATION_ERROR", "Invalid", details.clone());
        assert_eq!(error.error.details, Some(details));
    }

    #[test]
    fn test_article_error_maps_to_not_found() {
        let error: ApiError = ArticleServiceError::NotFound("Article 1 not found".into()).into();
        assert_eq!(error.error.code, "NOT_FOUND");
    }

    #[test]
    fn test_user_exists_maps_to_conflict() {
        let error: ApiError = UserServiceError::UserExists("Username taken".into()).into();
        assert_eq!(error.error.code, "CONFLICT");
    }
}
