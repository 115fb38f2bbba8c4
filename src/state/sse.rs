use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

use crate::dto::sse::ServerEvent;

/// Events queued per subscriber before the slowest one starts lagging.
const VIEW_CHANNEL_CAPACITY: usize = 32;

/// Broadcast hub feeding the view SSE stream.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl Default for SseHub {
    fn default() -> Self {
        Self::new(VIEW_CHANNEL_CAPACITY)
    }
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Serialize `payload` and send it under the `event` name.
    pub fn broadcast_json(&self, event: &str, payload: &impl Serialize) {
        match ServerEvent::json(Some(event.to_string()), payload) {
            Ok(event) => self.broadcast(event),
            Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
        }
    }
}
