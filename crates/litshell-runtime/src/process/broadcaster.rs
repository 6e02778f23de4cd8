//! Backend event broadcasting.
//!
//! Fan-out of lifecycle events to whatever presentation layer is
//! attached (desktop window, SSE bridge, tests). Each launch owns its
//! own channel; subscribers that lag simply miss events.

use litshell_core::BackendEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for backend events
const CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for backend lifecycle events
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<BackendEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast(&self, event: BackendEvent) {
        // Only log if there are receivers (avoid spam when nothing listens)
        if self.sender.receiver_count() > 0 {
            debug!(?event, "broadcasting backend event");
        }
        let _ = self.sender.send(event);
    }

    /// Subscribe to backend events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.broadcast(BackendEvent::starting(8501));
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, BackendEvent::Starting(_)));
    }

    #[test]
    fn broadcast_without_subscribers_is_a_noop() {
        let broadcaster = EventBroadcaster::new();
        assert_eq!(broadcaster.subscriber_count(), 0);
        broadcaster.broadcast(BackendEvent::timed_out(8501));
    }
}
