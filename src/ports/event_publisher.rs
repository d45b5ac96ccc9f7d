//! EventPublisher port - Interface for publishing domain events.
//!
//! Services publish after their unit of work has committed. Publishing is
//! never part of a transaction; a failed publish is logged by the notifier
//! and the mutation stands.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events to tenant and user rooms.
///
/// # Example
///
/// ```ignore
/// let event = GiftCardRedeemed { .. }.to_envelope();
/// publisher.publish(event).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publishes in order, stopping at the first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_publisher_is_object_safe() {
        fn _assert_trait_object(_: &dyn EventPublisher) {}
        fn _assert_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_send_sync::<std::sync::Arc<dyn EventPublisher>>();
    }
}
