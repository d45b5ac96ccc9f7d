//! CreatePosTransactionHandler - staff ring up a completed sale.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, Timestamp};
use crate::domain::ledger::{LedgerError, NewPosTransaction, PosTransaction, PosTransactionCreated};
use crate::domain::tenancy::TenantContext;
use crate::ports::PosRepository;

/// Receipt numbers carry six random characters per day; a clash just
/// draws again.
const RECEIPT_ATTEMPTS: usize = 3;

pub struct CreatePosTransactionHandler {
    transactions: Arc<dyn PosRepository>,
    notifier: Notifier,
}

impl CreatePosTransactionHandler {
    pub fn new(transactions: Arc<dyn PosRepository>, notifier: Notifier) -> Self {
        Self {
            transactions,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        request: NewPosTransaction,
    ) -> Result<PosTransaction, LedgerError> {
        let mut attempt = 0;
        let transaction = loop {
            attempt += 1;
            let now = Timestamp::now();
            let transaction = PosTransaction::complete(ctx.tenant_id, request.clone(), ctx.user_id, now)?;
            let audit = AuditEntry::record(
                ctx.actor(),
                Some(ctx.tenant_id),
                AuditAction::PosTransactionCreated,
                "pos_transaction",
                transaction.id,
            )
            .with_metadata(json!({
                "receipt_number": transaction.receipt_number,
                "total": transaction.total,
                "payment_method": transaction.payment_method,
            }))
            .at(now);

            match self.transactions.create(&transaction, &audit).await {
                Ok(()) => break transaction,
                Err(LedgerError::Conflict(_)) if attempt < RECEIPT_ATTEMPTS => continue,
                Err(e) => return Err(e),
            }
        };

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            receipt = %transaction.receipt_number,
            total = %transaction.total,
            "POS transaction recorded"
        );
        self.notifier
            .notify(&PosTransactionCreated {
                event_id: EventId::new(),
                tenant_id: transaction.tenant_id,
                transaction_id: transaction.id,
                receipt_number: transaction.receipt_number.clone(),
                total: transaction.total,
                customer_id: transaction.customer_id,
                occurred_at: transaction.created_at,
            })
            .await;
        Ok(transaction)
    }
}
