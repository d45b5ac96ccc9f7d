//! VoidPosTransactionHandler - staff void a completed sale.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, PosTransactionId, Timestamp};
use crate::domain::ledger::{LedgerError, PosTransaction, PosTransactionVoided};
use crate::domain::tenancy::TenantContext;
use crate::ports::{Mutation, PosRepository};

#[derive(Debug, Clone)]
pub struct VoidPosTransactionCommand {
    pub transaction_id: PosTransactionId,
    pub reason: Option<String>,
}

pub struct VoidPosTransactionHandler {
    transactions: Arc<dyn PosRepository>,
    notifier: Notifier,
}

impl VoidPosTransactionHandler {
    pub fn new(transactions: Arc<dyn PosRepository>, notifier: Notifier) -> Self {
        Self {
            transactions,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: VoidPosTransactionCommand,
    ) -> Result<PosTransaction, LedgerError> {
        let caller = *ctx;
        let reason = cmd.reason;
        let mutated = self
            .transactions
            .modify(ctx.tenant_id, cmd.transaction_id, &|transaction| {
                let now = Timestamp::now();
                transaction.void(reason.clone(), caller.user_id, now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::PosTransactionVoided,
                    "pos_transaction",
                    transaction.id,
                )
                .with_metadata(json!({
                    "receipt_number": transaction.receipt_number,
                    "reason": transaction.void_reason,
                }))
                .at(now);
                Ok(Mutation::audited((), audit))
            })
            .await?;

        let transaction = mutated.entity;
        tracing::info!(
            tenant_id = %ctx.tenant_id,
            receipt = %transaction.receipt_number,
            "POS transaction voided"
        );
        self.notifier
            .notify(&PosTransactionVoided {
                event_id: EventId::new(),
                tenant_id: transaction.tenant_id,
                transaction_id: transaction.id,
                receipt_number: transaction.receipt_number.clone(),
                voided_by: ctx.user_id,
                reason: transaction.void_reason.clone(),
                occurred_at: transaction.voided_at.unwrap_or(transaction.created_at),
            })
            .await;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::pos::{CreatePosTransactionHandler, GetPosTransactionHandler};
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::domain::foundation::Money;
    use crate::domain::ledger::{NewPosTransaction, PaymentMethod, PosLineItem, PosStatus};
    use crate::domain::tenancy::Role;

    fn sale() -> NewPosTransaction {
        NewPosTransaction {
            customer_id: None,
            items: vec![
                PosLineItem {
                    product_id: None,
                    name: "Protein bar".into(),
                    unit_price: Money::from_cents(450),
                    quantity: 2,
                },
                PosLineItem {
                    product_id: None,
                    name: "Towel".into(),
                    unit_price: Money::from_cents(1200),
                    quantity: 1,
                },
            ],
            discount: Money::from_cents(100),
            payment_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    #[tokio::test]
    async fn sale_is_totalled_then_voided_once() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let notifier = Notifier::new(Arc::new(bus.clone()));
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;

        let created = CreatePosTransactionHandler::new(Arc::new(store.clone()), notifier.clone())
            .handle(&staff, sale())
            .await
            .unwrap();
        assert_eq!(created.subtotal, Money::from_cents(2100));
        assert_eq!(created.total, Money::from_cents(2000));
        assert!(created.receipt_number.as_str().starts_with("RCP-"));
        assert_eq!(created.receipt_number.as_str().len(), "RCP-YYYYMMDD-XXXXXX".len());

        let handler = VoidPosTransactionHandler::new(Arc::new(store.clone()), notifier);
        let cmd = VoidPosTransactionCommand {
            transaction_id: created.id,
            reason: Some("wrong item".into()),
        };
        let voided = handler.handle(&staff, cmd.clone()).await.unwrap();
        assert_eq!(voided.status, PosStatus::Voided);
        assert_eq!(voided.voided_by, Some(staff.user_id));

        let err = handler.handle(&staff, cmd).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));

        let fetched = GetPosTransactionHandler::new(Arc::new(store.clone()))
            .handle(&staff, created.id)
            .await
            .unwrap();
        assert_eq!(fetched.status, PosStatus::Voided);
        assert!(bus.has_event("pos.transaction_voided.v1"));
    }

    #[tokio::test]
    async fn discount_above_subtotal_is_rejected() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let mut request = sale();
        request.discount = Money::from_cents(5000);

        let err = CreatePosTransactionHandler::new(
            Arc::new(store),
            Notifier::new(Arc::new(InMemoryEventBus::new())),
        )
        .handle(&staff, request)
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }
}
