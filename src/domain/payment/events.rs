//! Payment events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, PaymentId, SubscriptionId, TenantId, Timestamp, UserId};
use crate::domain_event;

use super::{Gateway, PaymentStatus, SubscriptionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusChanged {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub payment_id: PaymentId,
    pub customer_id: Option<UserId>,
    pub gateway: Gateway,
    pub previous_status: PaymentStatus,
    pub new_status: PaymentStatus,
    pub occurred_at: Timestamp,
}

domain_event!(
    PaymentStatusChanged,
    event_type = "payment.status_changed.v1",
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    tenant = tenant_id,
    user = customer_id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatusChanged {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub subscription_id: SubscriptionId,
    pub previous_status: SubscriptionStatus,
    pub new_status: SubscriptionStatus,
    pub occurred_at: Timestamp,
}

domain_event!(
    SubscriptionStatusChanged,
    event_type = "subscription.status_changed.v1",
    aggregate_id = subscription_id,
    aggregate_type = "Subscription",
    tenant = tenant_id,
    occurred_at = occurred_at,
    event_id = event_id
);
