//! Event broadcaster for identity events.
//!
//! The `EventBroadcaster` is the bus the OIDC services publish to. It wraps a
//! tokio broadcast channel, so publishing is synchronous, non-blocking and
//! independent of how many subscribers exist or how fast they drain.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::OidcEvent;

/// Default buffer size for the broadcast channel.
/// Events beyond this limit will cause older events to be dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Broadcaster for identity events.
///
/// Cheap to clone; all clones publish on the same channel.
///
/// # Example
///
/// ```
/// use oidc_bridge_core::events::{EventBroadcaster, OidcEvent};
///
/// let broadcaster = EventBroadcaster::new();
/// let mut receiver = broadcaster.subscribe();
///
/// broadcaster.send(OidcEvent::logout_initiated(None, None));
/// assert!(receiver.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<OidcEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new broadcaster with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new broadcaster wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, 0 when
    /// nobody is listening. Never blocks and never fails.
    pub fn send(&self, event: OidcEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribe to events.
    ///
    /// Events sent before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<OidcEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers.
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
