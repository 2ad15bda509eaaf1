//! Typed event bus for cross-widget signaling.
//!
//! The original design used ad-hoc globally named events; a typo in an
//! event name silently went nowhere. A closed enum makes every signal a
//! compile-time name.

use tokio::sync::broadcast;

const BUS_CAPACITY: usize = 64;

/// Events plugins exchange with each other and with the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginEvent {
    /// Toggle the overlay widget owned by the named plugin.
    ToggleWidget { plugin_id: String },
    /// The active session changed (`None` = back to a draft chat).
    SessionChanged { session_id: Option<String> },
    /// A document was opened in the viewer.
    DocumentOpened { url: String },
}

/// Broadcast channel for [`PluginEvent`]s.
///
/// Clones share the channel. Emitting with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PluginEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: PluginEvent) {
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(event);
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<PluginEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::new();
        bus.emit(PluginEvent::ToggleWidget {
            plugin_id: "cortex.notes".into(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(PluginEvent::SessionChanged {
            session_id: Some("s1".into()),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            PluginEvent::SessionChanged {
                session_id: Some("s1".into())
            }
        );
    }
}
