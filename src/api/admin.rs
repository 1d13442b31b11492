//! Admin API endpoints
//!
//! Handles HTTP requests for admin management:
//! - GET /api/v1/admin/stats - Site totals plus traffic aggregates
//! - GET /api/v1/admin/users - List users with roles
//! - PUT /api/v1/admin/users/{id}/role - Change a user's role
//! - DELETE /api/v1/admin/articles/{id} - Remove an article
//! - GET /api/v1/admin/traffic - Traffic summary
//!
//! All routes in this module sit behind require_auth + require_admin.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::auth::UserResponse;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{TrafficSummary, UserRole};
use crate::services::SiteStats;

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_admin_stats))
        .route("/users", get(list_users))
        .route("/users/{id}/role", put(set_user_role))
        .route("/articles/{id}", delete(delete_article))
        .route("/traffic", get(get_traffic))
}

/// Response for the admin dashboard header
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    #[serde(flatten)]
    pub site: SiteStats,
    pub traffic: TrafficSummary,
}

/// GET /api/v1/admin/stats - Site totals plus traffic aggregates
async fn get_admin_stats(
    State(state): State<AppState>,
) -> Result<Json<AdminStatsResponse>, ApiError> {
    let site = state
        .stats_service
        .site_stats()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let traffic = state.analytics_service.summary().await?;

    Ok(Json(AdminStatsResponse { site, traffic }))
}

/// Query parameters for listing users
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    50
}

/// Response for the user list
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// GET /api/v1/admin/users - List users with roles
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let (users, total) = state
        .user_service
        .list_users(query.page, query.per_page)
        .await?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        total,
        page: query.page,
        per_page: query.per_page,
    }))
}

/// Request body for a role change
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// PUT /api/v1/admin/users/{id}/role - Change a user's role
///
/// Demoting the last remaining admin is rejected, so the site can never
/// lose its admin.
async fn set_user_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role = UserRole::from_str(&body.role).map_err(ApiError::validation_error)?;

    let user = state.user_service.set_role(id, role).await?;

    Ok(Json(user.into()))
}

/// DELETE /api/v1/admin/articles/{id} - Remove an article
///
/// Cascades to its comments, likes, and media rows.
async fn delete_article(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.article_service.delete(id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/traffic - Traffic summary
async fn get_traffic(State(state): State<AppState>) -> Result<Json<TrafficSummary>, ApiError> {
    let summary = state.analytics_service.summary().await?;
    Ok(Json(summary))
}
