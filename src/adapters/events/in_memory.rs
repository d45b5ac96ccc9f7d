//! In-memory event bus for tests.
//!
//! Captures every published envelope so tests can assert on what was
//! delivered. Can be switched into a failing mode to exercise the
//! best-effort path of the notifier.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// Capturing event publisher. Clones share the captured list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    published: Arc<Mutex<Vec<EventEnvelope>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail without recording the event.
    pub fn fail_publishes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns all published events.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns events of a specific type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.published.lock().map(|events| events.len()).unwrap_or(0)
    }

    /// Checks if a specific event type was published.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.published_events()
            .iter()
            .any(|e| e.event_type == event_type)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                "event bus unavailable",
            ));
        }
        self.published
            .lock()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "event bus lock poisoned"))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{EventScope, TenantId};
    use serde_json::json;

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, "agg-1", "GiftCard", EventScope::tenant(TenantId::new()), json!({}))
    }

    #[tokio::test]
    async fn captures_published_events() {
        let bus = InMemoryEventBus::new();
        bus.publish(envelope("gift_card.redeemed.v1")).await.unwrap();
        bus.publish(envelope("voucher.redeemed.v1")).await.unwrap();

        assert_eq!(bus.event_count(), 2);
        assert!(bus.has_event("voucher.redeemed.v1"));
        assert_eq!(bus.events_of_type("gift_card.redeemed.v1").len(), 1);
    }

    #[tokio::test]
    async fn failing_mode_rejects_and_records_nothing() {
        let bus = InMemoryEventBus::new();
        bus.fail_publishes(true);
        assert!(bus.publish(envelope("gift_card.redeemed.v1")).await.is_err());
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_captured_events() {
        let bus = InMemoryEventBus::new();
        let handle = bus.clone();
        bus.publish_all(vec![envelope("a.v1"), envelope("b.v1")]).await.unwrap();
        assert_eq!(handle.event_count(), 2);
    }
}
