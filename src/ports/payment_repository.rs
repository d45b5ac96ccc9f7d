//! Payment and subscription repository ports.
//!
//! Webhook lookups run outside any tenant context: the gateway reference is
//! the only key a callback carries. Implementations bypass row-level
//! security for those calls only.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{PaymentId, TenantId};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::{
    Gateway, Payment, PaymentStatus, Reconciliation, Subscription, SubscriptionStatus,
};

use super::{MutateFn, Mutated};

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment, audit: &AuditEntry) -> Result<(), LedgerError>;

    async fn find(&self, tenant_id: TenantId, id: PaymentId) -> Result<Option<Payment>, LedgerError>;

    /// Administrative change. Closure output is the previous status.
    async fn modify(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        apply: &MutateFn<'_, Payment, PaymentStatus, LedgerError>,
    ) -> Result<Mutated<Payment, PaymentStatus>, LedgerError>;

    /// Locks the payment with this gateway reference and applies `apply`.
    /// `Ok(None)` when no payment carries the reference.
    async fn reconcile_by_reference(
        &self,
        gateway: Gateway,
        reference: &str,
        apply: &MutateFn<'_, Payment, Reconciliation<PaymentStatus>, LedgerError>,
    ) -> Result<Option<Mutated<Payment, Reconciliation<PaymentStatus>>>, LedgerError>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Fails `Conflict` when the gateway subscription id is already linked.
    async fn create(&self, subscription: &Subscription, audit: &AuditEntry) -> Result<(), LedgerError>;

    async fn find_for_tenant(&self, tenant_id: TenantId) -> Result<Option<Subscription>, LedgerError>;

    /// Locks the subscription with this gateway id and applies `apply`.
    /// `Ok(None)` when it is unknown.
    async fn reconcile_by_reference(
        &self,
        reference: &str,
        apply: &MutateFn<'_, Subscription, Reconciliation<SubscriptionStatus>, LedgerError>,
    ) -> Result<Option<Mutated<Subscription, Reconciliation<SubscriptionStatus>>>, LedgerError>;
}
