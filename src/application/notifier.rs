//! Best-effort realtime notification.
//!
//! Handlers call [`Notifier::notify`] only after their unit of work has
//! committed. A failed publish is logged and swallowed; it never turns a
//! committed mutation into an error.

use std::sync::Arc;

use crate::domain::foundation::SerializableDomainEvent;
use crate::ports::EventPublisher;

#[derive(Clone)]
pub struct Notifier {
    publisher: Arc<dyn EventPublisher>,
}

impl Notifier {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    pub async fn notify<E: SerializableDomainEvent>(&self, event: &E) {
        let envelope = event.to_envelope();
        let event_type = envelope.event_type.clone();
        if let Err(error) = self.publisher.publish(envelope).await {
            tracing::warn!(
                event_type = %event_type,
                error = %error,
                "Realtime notification dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{
        DomainError, ErrorCode, EventEnvelope, EventId, GiftCardId, Money, TenantId, Timestamp,
    };
    use crate::domain::ledger::GiftCardRedeemed;
    use async_trait::async_trait;

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _event: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::ExternalServiceError, "socket closed"))
        }
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let notifier = Notifier::new(Arc::new(FailingPublisher));
        notifier
            .notify(&GiftCardRedeemed {
                event_id: EventId::new(),
                tenant_id: TenantId::new(),
                gift_card_id: GiftCardId::new(),
                amount: Money::from_cents(100),
                remaining_balance: Money::ZERO,
                depleted: true,
                occurred_at: Timestamp::now(),
            })
            .await;
    }
}
