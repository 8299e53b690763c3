//! In-process change notifications

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    /// Profile, password, feature or PT grants of `username` changed.
    AuthChanged { username: String },
    SessionEnded,
    ApprovalCreated { pt: String },
}

pub struct EventBus {
    tx: broadcast::Sender<AuthEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: AuthEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Event dropped, no subscribers: {:?}", e.0);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(AuthEvent::SessionEnded);
    }

    #[test]
    fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(AuthEvent::AuthChanged { username: "ani".into() });
        bus.publish(AuthEvent::SessionEnded);

        assert_eq!(rx.try_recv().unwrap(), AuthEvent::AuthChanged { username: "ani".into() });
        assert_eq!(rx.try_recv().unwrap(), AuthEvent::SessionEnded);
        assert!(rx.try_recv().is_err());
    }
}
