//! Payment and subscription records.
//!
//! Status changes arrive from gateway webhooks or from an admin. Webhook
//! reconciliation is idempotent: re-applying the stored status is a no-op,
//! and a status that would move the record backwards is reported as stale
//! instead of raising.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Currency, Money, OrderId, PaymentId, StateMachine, SubscriptionId, TenantId, Timestamp,
    UserId,
};
use crate::domain::ledger::LedgerError;

use super::{Gateway, PaymentStatus, SubscriptionStatus};

/// Result of applying a gateway status to a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation<S> {
    /// Stored status already equals the incoming one.
    Unchanged,
    /// Status moved; carries the previous value.
    Applied { previous: S },
    /// Incoming status is not reachable from the stored one.
    Stale { current: S },
}

impl<S> Reconciliation<S> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Reconciliation::Applied { .. })
    }
}

fn reconcile_status<S: StateMachine>(current: &mut S, incoming: S) -> Reconciliation<S> {
    if *current == incoming {
        return Reconciliation::Unchanged;
    }
    match current.transition_to(incoming) {
        Ok(next) => {
            let previous = *current;
            *current = next;
            Reconciliation::Applied { previous }
        }
        Err(_) => Reconciliation::Stale { current: *current },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub customer_id: Option<UserId>,
    pub order_id: Option<OrderId>,
    pub amount: Money,
    pub currency: Currency,
    pub gateway: Gateway,
    pub status: PaymentStatus,
    /// Gateway correlation id: Stripe PaymentIntent id or Revenue Monster
    /// order id.
    pub gateway_reference: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    pub fn reconcile(
        &mut self,
        incoming: PaymentStatus,
        now: Timestamp,
    ) -> Reconciliation<PaymentStatus> {
        let outcome = reconcile_status(&mut self.status, incoming);
        if outcome.is_applied() {
            self.updated_at = now;
        }
        outcome
    }

    /// Administrative status change. Unlike webhook reconciliation, a
    /// no-op or backwards move is an error the admin should see.
    pub fn set_status(
        &mut self,
        target: PaymentStatus,
        now: Timestamp,
    ) -> Result<PaymentStatus, LedgerError> {
        let previous = self.status;
        self.status = previous.transition_to(target)?;
        self.updated_at = now;
        Ok(previous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub tenant_id: TenantId,
    pub gateway_subscription_id: String,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Applies a gateway status. A newer billing period end is recorded even
    /// when the status itself is unchanged.
    pub fn reconcile(
        &mut self,
        incoming: SubscriptionStatus,
        current_period_end: Option<Timestamp>,
        now: Timestamp,
    ) -> Reconciliation<SubscriptionStatus> {
        let outcome = reconcile_status(&mut self.status, incoming);
        if matches!(outcome, Reconciliation::Stale { .. }) {
            return outcome;
        }
        let mut changed = outcome.is_applied();
        if let Some(end) = current_period_end {
            if self.current_period_end != Some(end) {
                self.current_period_end = Some(end);
                changed = true;
            }
        }
        if changed {
            self.updated_at = now;
            if outcome == Reconciliation::Unchanged {
                return Reconciliation::Applied {
                    previous: self.status,
                };
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(status: PaymentStatus) -> Payment {
        let now = Timestamp::now();
        Payment {
            id: PaymentId::new(),
            tenant_id: TenantId::new(),
            customer_id: Some(UserId::new()),
            order_id: None,
            amount: Money::from_cents(10_000),
            currency: Currency::default(),
            gateway: Gateway::Stripe,
            status,
            gateway_reference: Some("pi_123".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn replay_is_unchanged() {
        let mut p = payment(PaymentStatus::Pending);
        let now = Timestamp::now();
        assert_eq!(
            p.reconcile(PaymentStatus::Succeeded, now),
            Reconciliation::Applied {
                previous: PaymentStatus::Pending
            }
        );
        assert_eq!(p.reconcile(PaymentStatus::Succeeded, now), Reconciliation::Unchanged);
        assert_eq!(p.status, PaymentStatus::Succeeded);
    }

    #[test]
    fn late_processing_after_success_is_stale() {
        let mut p = payment(PaymentStatus::Succeeded);
        let before = p.clone();
        assert_eq!(
            p.reconcile(PaymentStatus::Processing, Timestamp::now()),
            Reconciliation::Stale {
                current: PaymentStatus::Succeeded
            }
        );
        assert_eq!(p, before);
    }

    #[test]
    fn admin_cannot_reapply_same_status() {
        let mut p = payment(PaymentStatus::Succeeded);
        assert!(p.set_status(PaymentStatus::Succeeded, Timestamp::now()).is_err());
        assert_eq!(
            p.set_status(PaymentStatus::Refunded, Timestamp::now()),
            Ok(PaymentStatus::Succeeded)
        );
    }

    #[test]
    fn subscription_period_renewal_counts_as_change() {
        let now = Timestamp::now();
        let mut s = Subscription {
            id: SubscriptionId::new(),
            tenant_id: TenantId::new(),
            gateway_subscription_id: "sub_1".to_string(),
            plan: "pro".to_string(),
            status: SubscriptionStatus::Active,
            current_period_end: None,
            created_at: now,
            updated_at: now,
        };
        let end = now.add_days(30);
        assert!(s.reconcile(SubscriptionStatus::Active, Some(end), now).is_applied());
        assert_eq!(
            s.reconcile(SubscriptionStatus::Active, Some(end), now),
            Reconciliation::Unchanged
        );

        s.reconcile(SubscriptionStatus::Canceled, None, now);
        assert!(matches!(
            s.reconcile(SubscriptionStatus::Active, None, now),
            Reconciliation::Stale { .. }
        ));
    }
}
