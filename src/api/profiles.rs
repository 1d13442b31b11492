//! Profile API endpoints
//!
//! - GET /api/v1/profile - Current user's profile
//! - PUT /api/v1/profile - Update profile fields
//! - GET /api/v1/profile/stats - Aggregated author statistics

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{AuthorStats, ProfileView, UpdateProfileInput};

/// Response for a profile read
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

impl ProfileResponse {
    fn new(view: ProfileView, username: &str) -> Self {
        Self {
            user_id: view.user_id,
            username: username.to_string(),
            email: view.email,
            full_name: view.full_name,
            bio: view.bio,
            avatar_url: view.avatar_url,
            created_at: view.created_at.to_rfc3339(),
        }
    }
}

/// Request body for updating the profile
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// GET /api/v1/profile - Current user's profile
///
/// Requires authentication.
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let view = state.profile_service.get(user.0.id).await?;
    Ok(Json(ProfileResponse::new(view, &user.0.username)))
}

/// PUT /api/v1/profile - Update profile fields
///
/// Requires authentication. Only the provided fields change; the row is
/// created on first write.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let input = UpdateProfileInput {
        full_name: body.full_name,
        bio: body.bio,
        avatar_url: body.avatar_url,
    };

    state.profile_service.update(user.0.id, input).await?;

    // Return the merged view, not just the patched fields
    let view = state.profile_service.get(user.0.id).await?;
    Ok(Json(ProfileResponse::new(view, &user.0.username)))
}

/// GET /api/v1/profile/stats - Aggregated author statistics
///
/// Requires authentication.
pub async fn get_profile_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<AuthorStats>, ApiError> {
    let stats = state.profile_service.stats(user.0.id).await?;
    Ok(Json(stats))
}
