//! Event bus for court room observers
//!
//! Tokio broadcast channel wrapped so the simulation can publish without
//! caring whether anyone is listening.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::types::CourtEvent;
use crate::simulation::CourtObserver;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Broadcast event bus
pub struct EventBus {
    sender: broadcast::Sender<CourtEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers. Having none is fine.
    pub fn publish(&self, event: CourtEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CourtEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards simulation events onto an [`EventBus`]
#[derive(Clone)]
pub struct EventBusObserver {
    bus: SharedEventBus,
}

impl EventBusObserver {
    pub fn new(bus: SharedEventBus) -> Self {
        Self { bus }
    }
}

impl CourtObserver for EventBusObserver {
    fn on_event(&self, event: &CourtEvent) {
        self.bus.publish(event.clone());
    }
}
