//! Authentication API endpoints
//!
//! Handles HTTP requests for user authentication:
//! - POST /api/v1/auth/register - User registration
//! - POST /api/v1/auth/login - User login
//! - POST /api/v1/auth/logout - User logout
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::user::{LoginInput, RegisterInput, UserServiceError};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// POST /api/v1/auth/register - User registration
///
/// The first registered account becomes the admin; everyone after is a
/// member. A session is opened right away so the client is logged in.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password = body.password.clone();
    let input = RegisterInput::new(body.username, body.email, body.password);

    let user = state.user_service.register(input).await?;

    // Open a session for the new user
    let login_input = LoginInput::new(&user.username, &password);
    let session = state
        .user_service
        .login(login_input)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let headers = session_cookie_headers(&session.id, state.session_expiration_days)?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/login - User login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // IP rate limit first, then per-username lockout
    if let Some(ip) = extract_ip_address(&headers).and_then(|s| s.parse().ok()) {
        if state.rate_limiter.is_ip_limited(ip).await {
            return Err(ApiError::with_details(
                "RATE_LIMIT",
                "Too many requests, please try again later",
                serde_json::json!({"retry_after": 60}),
            ));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state
        .rate_limiter
        .is_username_limited(&body.username_or_email)
        .await
    {
        return Err(ApiError::with_details(
            "RATE_LIMIT",
            "Too many failed login attempts, please try again in 15 minutes",
            serde_json::json!({"retry_after": 900}),
        ));
    }

    let input = LoginInput::new(body.username_or_email.clone(), body.password);

    let session = state.user_service.login(input).await.map_err(|e| {
        let username = body.username_or_email.clone();
        let limiter = state.rate_limiter.clone();
        tokio::spawn(async move {
            limiter.record_failed_attempt(&username).await;
        });

        match e {
            UserServiceError::AuthenticationError(_) => {
                ApiError::unauthorized("Invalid username or password")
            }
            _ => ApiError::internal_error("Login failed"),
        }
    })?;

    let user = state
        .user_service
        .validate_session(&session.id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::internal_error("Session validation failed"))?;

    state
        .rate_limiter
        .clear_username_attempts(&body.username_or_email)
        .await;

    let response_headers = session_cookie_headers(&session.id, state.session_expiration_days)?;

    Ok((
        response_headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout - User logout
///
/// Requires authentication.
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // The token can arrive via cookie or Authorization header
    let token = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| {
            s.split(';')
                .find(|c| c.trim().starts_with("session="))
                .map(|c| c.trim().strip_prefix("session=").unwrap_or(""))
        })
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state
        .user_service
        .logout(token)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    // Clear the session cookie
    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me - Get current user
///
/// Requires authentication.
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// Build a Set-Cookie header carrying the session token (httpOnly)
fn session_cookie_headers(token: &str, expiration_days: i64) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token,
        expiration_days * 24 * 60 * 60
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid cookie value: {}", e)))?,
    );
    Ok(headers)
}

/// Extract IP address from request headers
/// Checks X-Forwarded-For and X-Real-IP (proxy/load balancer)
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return Some(ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ip_from_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            extract_ip_address(&headers),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_extract_ip_from_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(
            extract_ip_address(&headers),
            Some("198.51.100.4".to_string())
        );
    }

    #[test]
    fn test_extract_ip_none() {
        assert!(extract_ip_address(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_session_cookie_shape() {
        let headers = session_cookie_headers("abc123", 7).expect("Failed to build cookie");
        let cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .expect("Missing cookie header");
        assert!(cookie.contains("session=abc123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
    }
}
