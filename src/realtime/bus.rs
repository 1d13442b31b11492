//! Broadcast event bus
//!
//! A thin wrapper over `tokio::sync::broadcast`. Publishing never blocks;
//! slow subscribers that fall more than the channel capacity behind are
//! lagged by the channel and simply miss events.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::Category;

/// Default capacity of the broadcast channel
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Events fanned out to connected clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// A new article was published
    ArticleCreated {
        id: i64,
        title: String,
        category: Category,
    },
    /// The number of online readers changed
    PresenceChanged { online: usize },
}

impl RealtimeEvent {
    /// SSE event name for this variant
    pub fn kind(&self) -> &'static str {
        match self {
            RealtimeEvent::ArticleCreated { .. } => "article_created",
            RealtimeEvent::PresenceChanged { .. } => "presence_changed",
        }
    }
}

/// Broadcast bus shared by services (publishers) and SSE handlers
/// (subscribers).
pub struct EventBus {
    sender: broadcast::Sender<RealtimeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a custom channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it. Zero subscribers
    /// is not an error; the event is simply dropped.
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live stream of events for one subscriber.
///
/// Wraps the broadcast receiver so callers never see lag errors: if this
/// subscriber falls behind, the skipped events are dropped and the stream
/// resumes at the newest available event.
pub struct Subscription {
    receiver: broadcast::Receiver<RealtimeEvent>,
}

impl Subscription {
    /// Wait for the next event.
    ///
    /// Returns `None` when the bus has been dropped and no events remain.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
