//! Traffic analytics ingest endpoint
//!
//! - POST /api/v1/analytics/track - Record a page view
//!
//! Ingest is fire-and-forget: the response is always 202 and the write
//! happens off the request path. A broken or invalid event is logged
//! and dropped; tracking must never slow down or fail a page load.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::models::TrackEventInput;

/// Request body for a tracked page view
#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub page_path: String,
    pub referrer: Option<String>,
    pub session_id: String,
}

/// POST /api/v1/analytics/track - Record a page view
pub async fn track(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
    headers: HeaderMap,
    Json(body): Json<TrackRequest>,
) -> StatusCode {
    let input = TrackEventInput {
        page_path: body.page_path,
        referrer: body.referrer,
        session_id: body.session_id,
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let user_id = user.map(|Extension(AuthenticatedUser(user))| user.id);

    let analytics = state.analytics_service.clone();
    tokio::spawn(async move {
        if let Err(e) = analytics
            .record(input, user_agent.as_deref(), user_id)
            .await
        {
            tracing::debug!("Dropped analytics event: {}", e);
        }
    });

    StatusCode::ACCEPTED
}
