//! Realtime layer
//!
//! Fan-out of live events to connected clients over SSE: new-article
//! notifications and presence (online reader count) changes. The bus is a
//! `tokio::sync::broadcast` channel; presence is tracked with drop-guards so
//! a disconnecting client can never leak its slot.

pub mod bus;
pub mod presence;

pub use bus::{EventBus, RealtimeEvent, Subscription};
pub use presence::{PresenceGuard, PresenceRegistry};
