//! Stripe webhook event types.
//!
//! Only the fields the reconciler reads are captured. Everything else in
//! Stripe's event schema is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::Timestamp;

use super::{Gateway, GatewayUpdate, PaymentStatus, SubscriptionStatus, WebhookError};

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event. Null for some account events.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: JsonValue,
}

/// Stripe event types that move local records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    PaymentIntentSucceeded,
    PaymentIntentProcessing,
    PaymentIntentPaymentFailed,
    PaymentIntentCanceled,
    ChargeRefunded,
    CustomerSubscriptionCreated,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    InvoicePaid,
    InvoicePaymentFailed,
    Unknown,
}

impl StripeEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.processing" => Self::PaymentIntentProcessing,
            "payment_intent.payment_failed" => Self::PaymentIntentPaymentFailed,
            "payment_intent.canceled" => Self::PaymentIntentCanceled,
            "charge.refunded" => Self::ChargeRefunded,
            "customer.subscription.created" => Self::CustomerSubscriptionCreated,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    /// Local payment status for payment-intent and charge events.
    fn payment_status(&self) -> Option<PaymentStatus> {
        match self {
            Self::PaymentIntentSucceeded => Some(PaymentStatus::Succeeded),
            Self::PaymentIntentProcessing => Some(PaymentStatus::Processing),
            Self::PaymentIntentPaymentFailed | Self::PaymentIntentCanceled => {
                Some(PaymentStatus::Failed)
            }
            Self::ChargeRefunded => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl StripeEvent {
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }

    fn object_str(&self, field: &'static str) -> Option<&str> {
        self.data.object.get(field).and_then(JsonValue::as_str)
    }

    fn require_str(&self, field: &'static str) -> Result<String, WebhookError> {
        self.object_str(field)
            .map(str::to_string)
            .ok_or_else(|| WebhookError::ParseError(format!("data.object.{} is missing", field)))
    }

    fn unmapped(&self, raw_status: Option<String>) -> GatewayUpdate {
        GatewayUpdate::Unmapped {
            gateway: Gateway::Stripe,
            event_id: self.id.clone(),
            event_type: self.event_type.clone(),
            raw_status,
        }
    }

    /// Translates the event into a gateway-neutral update.
    ///
    /// Payment events correlate on the PaymentIntent id (`object.id`, or
    /// `object.payment_intent` for charges). Subscription events correlate
    /// on the subscription id (`object.id`, or `object.subscription` for
    /// invoices).
    pub fn to_update(&self) -> Result<GatewayUpdate, WebhookError> {
        let kind = self.parsed_type();

        if let Some(status) = kind.payment_status() {
            let reference = if kind == StripeEventType::ChargeRefunded {
                match self.object_str("payment_intent") {
                    Some(pi) => pi.to_string(),
                    // Charges created without a PaymentIntent have no local record.
                    None => return Ok(self.unmapped(None)),
                }
            } else {
                self.require_str("id")?
            };
            return Ok(GatewayUpdate::Payment {
                gateway: Gateway::Stripe,
                event_id: self.id.clone(),
                reference,
                status,
            });
        }

        match kind {
            StripeEventType::CustomerSubscriptionCreated
            | StripeEventType::CustomerSubscriptionUpdated
            | StripeEventType::CustomerSubscriptionDeleted => {
                let reference = self.require_str("id")?;
                let raw = if kind == StripeEventType::CustomerSubscriptionDeleted {
                    "canceled".to_string()
                } else {
                    self.require_str("status")?
                };
                let current_period_end = self
                    .data
                    .object
                    .get("current_period_end")
                    .and_then(JsonValue::as_i64)
                    .and_then(Timestamp::from_unix_secs);
                match SubscriptionStatus::from_stripe(&raw) {
                    Some(status) => Ok(GatewayUpdate::Subscription {
                        event_id: self.id.clone(),
                        reference,
                        status,
                        current_period_end,
                    }),
                    None => Ok(self.unmapped(Some(raw))),
                }
            }
            StripeEventType::InvoicePaid | StripeEventType::InvoicePaymentFailed => {
                let Some(reference) = self.object_str("subscription") else {
                    // One-off invoices are not tied to a tenant plan.
                    return Ok(self.unmapped(None));
                };
                let status = if kind == StripeEventType::InvoicePaid {
                    SubscriptionStatus::Active
                } else {
                    SubscriptionStatus::PastDue
                };
                Ok(GatewayUpdate::Subscription {
                    event_id: self.id.clone(),
                    reference: reference.to_string(),
                    status,
                    current_period_end: None,
                })
            }
            _ => Ok(self.unmapped(self.object_str("status").map(str::to_string))),
        }
    }
}
