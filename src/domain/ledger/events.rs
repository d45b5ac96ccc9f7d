//! Ledger events, published after the mutation commits.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    EventId, GiftCardId, Money, OrderId, PosTransactionId, SessionCreditId, SessionLogId,
    TenantId, Timestamp, UserId, VoucherId,
};
use crate::domain_event;

use super::{OrderStatus, ReceiptNumber};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCardIssued {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub gift_card_id: GiftCardId,
    pub code: String,
    pub initial_balance: Money,
    pub purchased_by: Option<UserId>,
    pub occurred_at: Timestamp,
}

domain_event!(
    GiftCardIssued,
    event_type = "gift_card.issued.v1",
    aggregate_id = gift_card_id,
    aggregate_type = "GiftCard",
    tenant = tenant_id,
    user = purchased_by,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCardRedeemed {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub gift_card_id: GiftCardId,
    pub amount: Money,
    pub remaining_balance: Money,
    pub depleted: bool,
    pub occurred_at: Timestamp,
}

domain_event!(
    GiftCardRedeemed,
    event_type = "gift_card.redeemed.v1",
    aggregate_id = gift_card_id,
    aggregate_type = "GiftCard",
    tenant = tenant_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherRedeemed {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub voucher_id: VoucherId,
    pub user_id: UserId,
    pub discount_amount: Money,
    pub used_count: u32,
    pub occurred_at: Timestamp,
}

domain_event!(
    VoucherRedeemed,
    event_type = "voucher.redeemed.v1",
    aggregate_id = voucher_id,
    aggregate_type = "Voucher",
    tenant = tenant_id,
    user = user_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLogged {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub session_log_id: SessionLogId,
    pub client_id: UserId,
    pub coach_id: UserId,
    pub credit_id: Option<SessionCreditId>,
    pub remaining_sessions: Option<u32>,
    pub occurred_at: Timestamp,
}

domain_event!(
    SessionLogged,
    event_type = "session.logged.v1",
    aggregate_id = session_log_id,
    aggregate_type = "SessionLog",
    tenant = tenant_id,
    user = client_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosTransactionCreated {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub transaction_id: PosTransactionId,
    pub receipt_number: ReceiptNumber,
    pub total: Money,
    pub customer_id: Option<UserId>,
    pub occurred_at: Timestamp,
}

domain_event!(
    PosTransactionCreated,
    event_type = "pos.transaction_created.v1",
    aggregate_id = transaction_id,
    aggregate_type = "PosTransaction",
    tenant = tenant_id,
    user = customer_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosTransactionVoided {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub transaction_id: PosTransactionId,
    pub receipt_number: ReceiptNumber,
    pub voided_by: UserId,
    pub reason: Option<String>,
    pub occurred_at: Timestamp,
}

domain_event!(
    PosTransactionVoided,
    event_type = "pos.transaction_voided.v1",
    aggregate_id = transaction_id,
    aggregate_type = "PosTransaction",
    tenant = tenant_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub total: Money,
    pub occurred_at: Timestamp,
}

domain_event!(
    OrderCreated,
    event_type = "order.created.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    tenant = tenant_id,
    user = customer_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub occurred_at: Timestamp,
}

domain_event!(
    OrderStatusChanged,
    event_type = "order.status_changed.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    tenant = tenant_id,
    user = customer_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainEvent, SerializableDomainEvent};

    #[test]
    fn order_events_reach_the_customer_room() {
        let customer = UserId::new();
        let event = OrderStatusChanged {
            event_id: EventId::new(),
            tenant_id: TenantId::new(),
            order_id: OrderId::new(),
            customer_id: customer,
            previous_status: OrderStatus::Pending,
            new_status: OrderStatus::Confirmed,
            occurred_at: Timestamp::now(),
        };
        assert_eq!(event.scope().user_id, Some(customer));
        assert_eq!(event.to_envelope().payload["new_status"], "confirmed");
    }

    #[test]
    fn gift_card_redemption_stays_in_tenant_room() {
        let event = GiftCardRedeemed {
            event_id: EventId::new(),
            tenant_id: TenantId::new(),
            gift_card_id: GiftCardId::new(),
            amount: Money::from_cents(100),
            remaining_balance: Money::from_cents(400),
            depleted: false,
            occurred_at: Timestamp::now(),
        };
        assert!(event.scope().user_id.is_none());
        assert_eq!(event.event_type(), "gift_card.redeemed.v1");
    }
}
