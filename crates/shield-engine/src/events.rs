//! Event bus for engine-wide event distribution

use shield_core::Event;

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Event bus distributing engine events to the rendering layer
pub struct EventBus {
    /// Broadcast sender for events
    sender: broadcast::Sender<Event>,
    /// Event history (last N events)
    history: Arc<RwLock<Vec<Event>>>,
    /// Maximum history size
    max_history: usize,
}

impl EventBus {
    /// Create a new event bus
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            history: Arc::new(RwLock::new(Vec::new())),
            max_history: 256,
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publish an event
    pub fn publish(&self, event: Event) {
        {
            let mut history = self.history.write();
            history.push(event.clone());
            if history.len() > self.max_history {
                history.remove(0);
            }
        }

        // No subscribers is fine; the engine runs headless in tests
        let _ = self.sender.send(event);

        debug!("Event published");
    }

    /// Get recent events, oldest first
    pub fn recent(&self, count: usize) -> Vec<Event> {
        let history = self.history.read();
        let start = history.len().saturating_sub(count);
        history[start..].to_vec()
    }

    /// Get subscriber count (approximate)
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            history: self.history.clone(),
            max_history: self.max_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shield_core::MissionPhase;

    #[test]
    fn test_event_publishing_records_history() {
        let bus = EventBus::new(100);

        for _ in 0..5 {
            bus.publish(Event::phase_changed(
                MissionPhase::Preparing,
                MissionPhase::Ready,
            ));
        }

        assert_eq!(bus.recent(3).len(), 3);
    }

    #[tokio::test]
    async fn test_subscription_receives_events() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        bus.publish(Event::blast_radius(15.0));

        assert!(rx.try_recv().is_ok());
    }
}
