//! UpdatePaymentStatusHandler - admin override of a payment's status.
//!
//! Goes through the same state machine as webhooks, but a no-op or
//! backwards move is rejected instead of acknowledged.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, PaymentId, Timestamp};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::{Payment, PaymentStatus, PaymentStatusChanged};
use crate::domain::tenancy::TenantContext;
use crate::ports::{Mutation, PaymentRepository};

#[derive(Debug, Clone)]
pub struct UpdatePaymentStatusCommand {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
}

pub struct UpdatePaymentStatusHandler {
    payments: Arc<dyn PaymentRepository>,
    notifier: Notifier,
}

impl UpdatePaymentStatusHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>, notifier: Notifier) -> Self {
        Self { payments, notifier }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: UpdatePaymentStatusCommand,
    ) -> Result<Payment, LedgerError> {
        let caller = *ctx;
        let mutated = self
            .payments
            .modify(ctx.tenant_id, cmd.payment_id, &|payment| {
                let now = Timestamp::now();
                let previous = payment.set_status(cmd.status, now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::PaymentStatusUpdated,
                    "payment",
                    payment.id,
                )
                .with_metadata(json!({
                    "previous_status": previous,
                    "status": payment.status,
                }))
                .at(now);
                Ok(Mutation::audited(previous, audit))
            })
            .await?;
        let payment = mutated.entity;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            payment_id = %payment.id,
            previous = %mutated.child,
            status = %payment.status,
            "Payment status updated"
        );
        self.notifier
            .notify(&PaymentStatusChanged {
                event_id: EventId::new(),
                tenant_id: payment.tenant_id,
                payment_id: payment.id,
                customer_id: payment.customer_id,
                gateway: payment.gateway,
                previous_status: mutated.child,
                new_status: payment.status,
                occurred_at: payment.updated_at,
            })
            .await;
        Ok(payment)
    }
}
