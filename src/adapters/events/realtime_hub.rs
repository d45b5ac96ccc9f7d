//! Room-based realtime fan-out.
//!
//! Every tenant has a staff room and every user a personal room. A
//! published envelope goes to the room of its tenant scope and, when the
//! scope names a user, to that user's room as well.
//!
//! ```text
//! Room: tenant-A        Room: user-42
//! ├── socket-1          └── socket-3
//! └── socket-2
//! ```
//!
//! Rooms are `tokio::sync::broadcast` channels created on first join and
//! dropped once their last receiver leaves. A slow socket lags and misses
//! events; nothing upstream ever waits on it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{broadcast, RwLock};

use crate::domain::foundation::{DomainError, EventEnvelope, TenantId, UserId};
use crate::ports::EventPublisher;

const DEFAULT_CAPACITY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Tenant(TenantId),
    User(UserId),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Tenant(id) => write!(f, "tenant:{}", id),
            Room::User(id) => write!(f, "user:{}", id),
        }
    }
}

pub struct RealtimeHub {
    rooms: RwLock<HashMap<Room, broadcast::Sender<EventEnvelope>>>,
    channel_capacity: usize,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    /// Subscribes to `room`, creating it if needed.
    pub async fn join(&self, room: Room) -> broadcast::Receiver<EventEnvelope> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .subscribe()
    }

    /// Drops `room` when nobody listens any more. Callers invoke this after
    /// dropping their receiver.
    pub async fn leave(&self, room: Room) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(&room).is_some_and(|tx| tx.receiver_count() == 0) {
            rooms.remove(&room);
        }
    }

    pub async fn subscriber_count(&self, room: Room) -> usize {
        self.rooms
            .read()
            .await
            .get(&room)
            .map_or(0, |tx| tx.receiver_count())
    }

    pub async fn active_rooms(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn send(&self, room: Room, envelope: &EventEnvelope) {
        let rooms = self.rooms.read().await;
        if let Some(tx) = rooms.get(&room) {
            // No receivers is fine.
            let _ = tx.send(envelope.clone());
        }
    }
}

#[async_trait]
impl EventPublisher for RealtimeHub {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if let Some(tenant_id) = event.scope.tenant_id {
            self.send(Room::Tenant(tenant_id), &event).await;
        }
        if let Some(user_id) = event.scope.user_id {
            self.send(Room::User(user_id), &event).await;
        }
        tracing::trace!(event_type = %event.event_type, "Realtime event fanned out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{EventId, GiftCardId, Money, SerializableDomainEvent, Timestamp};
    use crate::domain::ledger::GiftCardRedeemed;

    fn redeemed(tenant_id: TenantId) -> EventEnvelope {
        GiftCardRedeemed {
            event_id: EventId::new(),
            tenant_id,
            gift_card_id: GiftCardId::new(),
            amount: Money::from_cents(100),
            remaining_balance: Money::from_cents(900),
            depleted: false,
            occurred_at: Timestamp::now(),
        }
        .to_envelope()
    }

    #[tokio::test]
    async fn tenant_room_receives_only_its_events() {
        let hub = RealtimeHub::default();
        let mine = TenantId::new();
        let mut rx = hub.join(Room::Tenant(mine)).await;

        hub.publish(redeemed(TenantId::new())).await.unwrap();
        hub.publish(redeemed(mine)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.scope.tenant_id, Some(mine));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn user_scope_reaches_personal_room() {
        let hub = RealtimeHub::default();
        let user = UserId::new();
        let mut rx = hub.join(Room::User(user)).await;

        let mut envelope = redeemed(TenantId::new());
        envelope.scope = envelope.scope.with_user(user);
        hub.publish(envelope).await.unwrap();

        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn publishing_to_empty_room_succeeds() {
        let hub = RealtimeHub::default();
        assert!(hub.publish(redeemed(TenantId::new())).await.is_ok());
    }

    #[tokio::test]
    async fn last_leave_drops_the_room() {
        let hub = RealtimeHub::default();
        let room = Room::Tenant(TenantId::new());
        let rx = hub.join(room).await;
        assert_eq!(hub.subscriber_count(room).await, 1);

        drop(rx);
        hub.leave(room).await;
        assert_eq!(hub.active_rooms().await, 0);
    }
}
