//! Presence registry
//!
//! Tracks how many clients currently hold an open event stream. Each
//! connection gets an ephemeral UUID slot and a [`PresenceGuard`]; the
//! guard's Drop removes the slot, so the count stays correct on any
//! disconnect path, clean or otherwise.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::realtime::bus::{EventBus, RealtimeEvent};

/// Registry of currently connected clients
pub struct PresenceRegistry {
    online: Mutex<HashSet<Uuid>>,
    bus: Arc<EventBus>,
}

impl PresenceRegistry {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            online: Mutex::new(HashSet::new()),
            bus,
        }
    }

    /// Register a new connection and return its guard.
    ///
    /// Publishes a `PresenceChanged` event with the new count.
    pub fn track(self: &Arc<Self>) -> PresenceGuard {
        let key = Uuid::new_v4();
        let count = {
            let mut online = self.online.lock().unwrap_or_else(|e| e.into_inner());
            online.insert(key);
            online.len()
        };
        self.bus.publish(RealtimeEvent::PresenceChanged { online: count });

        PresenceGuard {
            registry: Arc::clone(self),
            key,
        }
    }

    /// Number of currently connected clients
    pub fn online_count(&self) -> usize {
        self.online.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn remove(&self, key: Uuid) {
        let count = {
            let mut online = self.online.lock().unwrap_or_else(|e| e.into_inner());
            online.remove(&key);
            online.len()
        };
        self.bus.publish(RealtimeEvent::PresenceChanged { online: count });
    }
}

/// RAII handle for one tracked connection. Dropping it deregisters the
/// connection and publishes the updated count.
pub struct PresenceGuard {
    registry: Arc<PresenceRegistry>,
    key: Uuid,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        self.registry.remove(self.key);
    }
}
