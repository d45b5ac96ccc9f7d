//! Gateway-neutral form of a verified webhook.

use crate::domain::foundation::Timestamp;

use super::{Gateway, PaymentStatus, SubscriptionStatus};

/// What a verified webhook asks the reconciler to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayUpdate {
    Payment {
        gateway: Gateway,
        event_id: String,
        reference: String,
        status: PaymentStatus,
    },
    Subscription {
        event_id: String,
        reference: String,
        status: SubscriptionStatus,
        current_period_end: Option<Timestamp>,
    },
    /// Event type or status with no local meaning. Acknowledged and logged.
    Unmapped {
        gateway: Gateway,
        event_id: String,
        event_type: String,
        raw_status: Option<String>,
    },
}

impl GatewayUpdate {
    pub fn gateway(&self) -> Gateway {
        match self {
            GatewayUpdate::Payment { gateway, .. } | GatewayUpdate::Unmapped { gateway, .. } => {
                *gateway
            }
            GatewayUpdate::Subscription { .. } => Gateway::Stripe,
        }
    }

    pub fn event_id(&self) -> &str {
        match self {
            GatewayUpdate::Payment { event_id, .. }
            | GatewayUpdate::Subscription { event_id, .. }
            | GatewayUpdate::Unmapped { event_id, .. } => event_id,
        }
    }
}
