//! Gift cards, vouchers, session credits, point-of-sale and orders.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{
    GiftCardId, OrderId, PosTransactionId, ProductId, SessionCreditId, SessionPackageId,
    TenantId, UserId, VoucherId,
};
use crate::domain::ledger::{
    GiftCard, GiftCardCode, GiftCardTransaction, LedgerError, Order, OrderStatus,
    PosTransaction, Product, SessionCredit, SessionLog, SessionPackage, Voucher,
    VoucherRedemption,
};
use crate::ports::{
    GiftCardRepository, LogSessionFn, MutateFn, Mutated, OrderRepository, PosRepository,
    ProductCatalog, SessionRepository, VoucherRepository,
};

use super::{apply_to_slot, InMemoryStore};

#[async_trait]
impl GiftCardRepository for InMemoryStore {
    async fn issue(
        &self,
        card: &GiftCard,
        purchase: &GiftCardTransaction,
        audit: &AuditEntry,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if state
            .gift_cards
            .values()
            .any(|c| c.tenant_id == card.tenant_id && c.code == card.code)
        {
            return Err(LedgerError::Conflict(format!(
                "gift card code {} already exists",
                card.code
            )));
        }
        state.gift_cards.insert(card.id, card.clone());
        state.gift_card_transactions.push(purchase.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find_by_code(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
    ) -> Result<Option<GiftCard>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .gift_cards
            .values()
            .find(|c| c.tenant_id == tenant_id && &c.code == code)
            .cloned())
    }

    async fn history(
        &self,
        tenant_id: TenantId,
        card_id: GiftCardId,
    ) -> Result<Vec<GiftCardTransaction>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .gift_card_transactions
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.gift_card_id == card_id)
            .cloned()
            .collect())
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
        apply: &MutateFn<'_, GiftCard, Option<GiftCardTransaction>, LedgerError>,
    ) -> Result<Mutated<GiftCard, Option<GiftCardTransaction>>, LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let slot = state
            .gift_cards
            .values_mut()
            .find(|c| c.tenant_id == tenant_id && &c.code == code)
            .ok_or(LedgerError::not_found("gift_card"))?;
        let mutated = apply_to_slot(slot, &mut state.audit_log, apply)?;
        if mutated.written {
            if let Some(row) = &mutated.child {
                state.gift_card_transactions.push(row.clone());
            }
        }
        Ok(mutated)
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
        audit_for: &(dyn for<'g> Fn(&'g GiftCard) -> Result<AuditEntry, LedgerError> + Send + Sync),
    ) -> Result<GiftCard, LedgerError> {
        let mut state = self.state.lock().await;
        let card = state
            .gift_cards
            .values()
            .find(|c| c.tenant_id == tenant_id && &c.code == code)
            .cloned()
            .ok_or(LedgerError::not_found("gift_card"))?;
        let audit = audit_for(&card)?;
        state.gift_cards.remove(&card.id);
        state
            .gift_card_transactions
            .retain(|t| t.gift_card_id != card.id);
        state.audit_log.push(audit);
        Ok(card)
    }
}

#[async_trait]
impl VoucherRepository for InMemoryStore {
    async fn create(&self, voucher: &Voucher, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if state
            .vouchers
            .values()
            .any(|v| v.tenant_id == voucher.tenant_id && v.code == voucher.code)
        {
            return Err(LedgerError::Conflict(format!(
                "voucher code {} already exists",
                voucher.code
            )));
        }
        state.vouchers.insert(voucher.id, voucher.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find(&self, tenant_id: TenantId, id: VoucherId) -> Result<Option<Voucher>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .vouchers
            .get(&id)
            .filter(|v| v.tenant_id == tenant_id)
            .cloned())
    }

    async fn redemptions(
        &self,
        tenant_id: TenantId,
        id: VoucherId,
    ) -> Result<Vec<VoucherRedemption>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .voucher_redemptions
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.voucher_id == id)
            .cloned()
            .collect())
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        id: VoucherId,
        apply: &MutateFn<'_, Voucher, Option<VoucherRedemption>, LedgerError>,
    ) -> Result<Mutated<Voucher, Option<VoucherRedemption>>, LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let slot = state
            .vouchers
            .get_mut(&id)
            .filter(|v| v.tenant_id == tenant_id)
            .ok_or(LedgerError::not_found("voucher"))?;
        let mutated = apply_to_slot(slot, &mut state.audit_log, apply)?;
        if mutated.written {
            if let Some(row) = &mutated.child {
                state.voucher_redemptions.push(row.clone());
            }
        }
        Ok(mutated)
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create_package(
        &self,
        package: &SessionPackage,
        audit: &AuditEntry,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        state.session_packages.insert(package.id, package.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find_package(
        &self,
        tenant_id: TenantId,
        id: SessionPackageId,
    ) -> Result<Option<SessionPackage>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .session_packages
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn grant_credit(&self, credit: &SessionCredit, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        state.session_credits.insert(credit.id, credit.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find_credit(
        &self,
        tenant_id: TenantId,
        id: SessionCreditId,
    ) -> Result<Option<SessionCredit>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .session_credits
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .cloned())
    }

    async fn credits_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Vec<SessionCredit>, LedgerError> {
        let state = self.state.lock().await;
        let mut credits: Vec<SessionCredit> = state
            .session_credits
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.user_id == user_id)
            .cloned()
            .collect();
        credits.sort_by_key(|c| c.created_at);
        Ok(credits)
    }

    async fn logs_for_credit(
        &self,
        tenant_id: TenantId,
        credit_id: SessionCreditId,
    ) -> Result<Vec<SessionLog>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .session_logs
            .iter()
            .filter(|l| l.tenant_id == tenant_id && l.credit_id == Some(credit_id))
            .cloned()
            .collect())
    }

    async fn log_session(
        &self,
        tenant_id: TenantId,
        credit_id: Option<SessionCreditId>,
        build: &LogSessionFn<'_>,
    ) -> Result<(SessionLog, Option<SessionCredit>), LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let mut credit = match credit_id {
            Some(id) => Some(
                state
                    .session_credits
                    .get(&id)
                    .filter(|c| c.tenant_id == tenant_id)
                    .cloned()
                    .ok_or(LedgerError::not_found("session_credit"))?,
            ),
            None => None,
        };

        let mutation = build(credit.as_mut())?;
        let Some(audit) = mutation.audit else {
            return Err(LedgerError::infrastructure("session log built without an audit entry"));
        };

        if let Some(updated) = &credit {
            state.session_credits.insert(updated.id, updated.clone());
        }
        state.session_logs.push(mutation.child.clone());
        state.audit_log.push(audit);
        Ok((mutation.child, credit))
    }
}

#[async_trait]
impl PosRepository for InMemoryStore {
    async fn create(&self, transaction: &PosTransaction, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if state.pos_transactions.values().any(|t| {
            t.tenant_id == transaction.tenant_id && t.receipt_number == transaction.receipt_number
        }) {
            return Err(LedgerError::Conflict(format!(
                "receipt number {} already exists",
                transaction.receipt_number
            )));
        }
        state
            .pos_transactions
            .insert(transaction.id, transaction.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: PosTransactionId,
    ) -> Result<Option<PosTransaction>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .pos_transactions
            .get(&id)
            .filter(|t| t.tenant_id == tenant_id)
            .cloned())
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        id: PosTransactionId,
        apply: &MutateFn<'_, PosTransaction, (), LedgerError>,
    ) -> Result<Mutated<PosTransaction, ()>, LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let slot = state
            .pos_transactions
            .get_mut(&id)
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or(LedgerError::not_found("pos_transaction"))?;
        apply_to_slot(slot, &mut state.audit_log, apply)
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create(&self, order: &Order, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        state.orders.insert(order.id, order.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find(&self, tenant_id: TenantId, id: OrderId) -> Result<Option<Order>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .cloned())
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        apply: &MutateFn<'_, Order, OrderStatus, LedgerError>,
    ) -> Result<Mutated<Order, OrderStatus>, LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let slot = state
            .orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .ok_or(LedgerError::not_found("order"))?;
        apply_to_slot(slot, &mut state.audit_log, apply)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryStore {
    async fn find_many(
        &self,
        tenant_id: TenantId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, LedgerError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id))
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}
