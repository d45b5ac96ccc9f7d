//! Payments, subscriptions and the audit reader.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{DomainError, PaymentId, TenantId, Timestamp};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::{
    Gateway, Payment, PaymentStatus, Reconciliation, Subscription, SubscriptionStatus,
};
use crate::ports::{
    AuditLogReader, MutateFn, Mutated, PaymentRepository, SubscriptionRepository,
};

use super::{apply_to_slot, InMemoryStore};

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn create(&self, payment: &Payment, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if let Some(reference) = &payment.gateway_reference {
            let taken = state.payments.values().any(|p| {
                p.gateway == payment.gateway && p.gateway_reference.as_ref() == Some(reference)
            });
            if taken {
                return Err(LedgerError::Conflict(format!(
                    "{} reference {} is already recorded",
                    payment.gateway, reference
                )));
            }
        }
        state.payments.insert(payment.id, payment.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find(&self, tenant_id: TenantId, id: PaymentId) -> Result<Option<Payment>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        apply: &MutateFn<'_, Payment, PaymentStatus, LedgerError>,
    ) -> Result<Mutated<Payment, PaymentStatus>, LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let slot = state
            .payments
            .get_mut(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or(LedgerError::not_found("payment"))?;
        apply_to_slot(slot, &mut state.audit_log, apply)
    }

    async fn reconcile_by_reference(
        &self,
        gateway: Gateway,
        reference: &str,
        apply: &MutateFn<'_, Payment, Reconciliation<PaymentStatus>, LedgerError>,
    ) -> Result<Option<Mutated<Payment, Reconciliation<PaymentStatus>>>, LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let Some(slot) = state.payments.values_mut().find(|p| {
            p.gateway == gateway && p.gateway_reference.as_deref() == Some(reference)
        }) else {
            return Ok(None);
        };
        apply_to_slot(slot, &mut state.audit_log, apply).map(Some)
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn create(&self, subscription: &Subscription, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if state
            .subscriptions
            .values()
            .any(|s| s.gateway_subscription_id == subscription.gateway_subscription_id)
        {
            return Err(LedgerError::Conflict(format!(
                "subscription {} is already linked",
                subscription.gateway_subscription_id
            )));
        }
        state
            .subscriptions
            .insert(subscription.id, subscription.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find_for_tenant(&self, tenant_id: TenantId) -> Result<Option<Subscription>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .subscriptions
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn reconcile_by_reference(
        &self,
        reference: &str,
        apply: &MutateFn<'_, Subscription, Reconciliation<SubscriptionStatus>, LedgerError>,
    ) -> Result<Option<Mutated<Subscription, Reconciliation<SubscriptionStatus>>>, LedgerError>
    {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let Some(slot) = state
            .subscriptions
            .values_mut()
            .find(|s| s.gateway_subscription_id == reference)
        else {
            return Ok(None);
        };
        apply_to_slot(slot, &mut state.audit_log, apply).map(Some)
    }
}

#[async_trait]
impl AuditLogReader for InMemoryStore {
    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        before: Option<Timestamp>,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let state = self.state.lock().await;
        let mut entries: Vec<AuditEntry> = state
            .audit_log
            .iter()
            .filter(|e| e.tenant_id == Some(tenant_id))
            .filter(|e| before.map_or(true, |b| e.created_at.is_before(&b)))
            .cloned()
            .collect();
        // Equal timestamps come out newest-inserted first.
        entries.sort_by_key(|e| e.created_at);
        entries.reverse();
        entries.truncate(limit as usize);
        Ok(entries)
    }
}
