//! Realtime endpoints
//!
//! - GET /api/v1/events - SSE stream of realtime events
//! - GET /api/v1/stats/live - Online reader count + article total
//!
//! Opening the event stream registers the connection in the presence
//! registry; the guard travels inside the stream state, so a dropped
//! connection deregisters itself and the online count corrects.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::realtime::{PresenceGuard, Subscription};

/// GET /api/v1/events - SSE stream of realtime events
///
/// Streams article-created and presence-changed events, with periodic
/// keep-alive comments so proxies do not cut the idle connection.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let guard = state.presence.track();
    let subscription = state.bus.subscribe();

    Sse::new(event_stream(subscription, guard)).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(state.realtime_config.keep_alive_secs)),
    )
}

fn event_stream(
    subscription: Subscription,
    guard: PresenceGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold((subscription, guard), |(mut subscription, guard)| async {
        loop {
            let event = subscription.recv().await?;
            match Event::default().event(event.kind()).json_data(&event) {
                Ok(sse_event) => return Some((Ok(sse_event), (subscription, guard))),
                Err(e) => {
                    tracing::warn!("Failed to serialize realtime event: {}", e);
                    continue;
                }
            }
        }
    })
}

/// Response for the live stats widget
#[derive(Debug, Serialize)]
pub struct LiveStatsResponse {
    pub online: usize,
    pub total_articles: i64,
}

/// GET /api/v1/stats/live - Online reader count + article total
pub async fn live_stats(
    State(state): State<AppState>,
) -> Result<Json<LiveStatsResponse>, ApiError> {
    let total_articles = state
        .stats_service
        .total_articles()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(LiveStatsResponse {
        online: state.presence.online_count(),
        total_articles,
    }))
}
