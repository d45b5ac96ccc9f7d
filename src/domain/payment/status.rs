//! Payment and subscription status vocabularies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Payment gateway a record is settled through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gateway {
    Stripe,
    RevenueMonster,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Stripe => "stripe",
            Gateway::RevenueMonster => "revenue_monster",
        }
    }

    /// Parses the `{gateway}` path segment of the webhook route. Accepts
    /// both `revenue_monster` and `revenue-monster`.
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "stripe" => Some(Gateway::Stripe),
            "revenue_monster" | "revenue-monster" => Some(Gateway::RevenueMonster),
            _ => None,
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gateway {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gateway::from_path(s).ok_or_else(|| {
            ValidationError::invalid_format("gateway", format!("unknown gateway '{}'", s))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown payment status '{}'", other),
            )),
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// A failed payment may be retried by the gateway; a refund is final.
    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Processing, Succeeded, Failed],
            Processing => vec![Succeeded, Failed],
            Failed => vec![Processing, Succeeded],
            Succeeded => vec![Refunded],
            Refunded => vec![],
        }
    }
}

/// Tenant plan subscription status, following the Stripe vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Incomplete,
    Trialing,
    Active,
    PastDue,
    Unpaid,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Maps a Stripe `subscription.status`. `incomplete_expired` is final
    /// and treated as canceled; `paused` has no local counterpart.
    pub fn from_stripe(status: &str) -> Option<Self> {
        match status {
            "incomplete" => Some(SubscriptionStatus::Incomplete),
            "trialing" => Some(SubscriptionStatus::Trialing),
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "unpaid" => Some(SubscriptionStatus::Unpaid),
            "canceled" | "incomplete_expired" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::from_stripe(s).ok_or_else(|| {
            ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", s),
            )
        })
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self != target && *self != SubscriptionStatus::Canceled
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        [Incomplete, Trialing, Active, PastDue, Unpaid, Canceled]
            .into_iter()
            .filter(|s| self.can_transition_to(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refunded_is_terminal() {
        assert!(PaymentStatus::Refunded.is_terminal());
        assert!(!PaymentStatus::Succeeded.can_transition_to(&PaymentStatus::Processing));
        assert!(PaymentStatus::Succeeded.can_transition_to(&PaymentStatus::Refunded));
    }

    #[test]
    fn failed_payment_can_be_retried() {
        assert!(PaymentStatus::Failed.can_transition_to(&PaymentStatus::Succeeded));
    }

    #[test]
    fn gateway_path_accepts_both_spellings() {
        assert_eq!(Gateway::from_path("revenue-monster"), Some(Gateway::RevenueMonster));
        assert_eq!(Gateway::from_path("revenue_monster"), Some(Gateway::RevenueMonster));
        assert_eq!(Gateway::from_path("paypal"), None);
    }

    #[test]
    fn canceled_subscription_is_terminal() {
        assert!(SubscriptionStatus::Canceled.is_terminal());
        assert_eq!(SubscriptionStatus::Active.valid_transitions().len(), 5);
    }

    #[test]
    fn stripe_subscription_vocabulary() {
        assert_eq!(
            SubscriptionStatus::from_stripe("incomplete_expired"),
            Some(SubscriptionStatus::Canceled)
        );
        assert_eq!(SubscriptionStatus::from_stripe("paused"), None);
    }
}
