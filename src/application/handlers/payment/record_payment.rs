//! RecordPaymentHandler - staff register a gateway payment before the
//! gateway confirms it.
//!
//! The payment starts `pending`; webhooks move it from there.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Currency, Money, OrderId, PaymentId, Timestamp, UserId};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::{Gateway, Payment, PaymentStatus};
use crate::domain::tenancy::TenantContext;
use crate::ports::PaymentRepository;

#[derive(Debug, Clone)]
pub struct RecordPaymentCommand {
    pub amount: i64,
    pub currency: Option<String>,
    pub gateway: Gateway,
    pub gateway_reference: Option<String>,
    pub customer_id: Option<UserId>,
    pub order_id: Option<OrderId>,
}

pub struct RecordPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl RecordPaymentHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: RecordPaymentCommand,
    ) -> Result<Payment, LedgerError> {
        let amount = Money::from_cents(cmd.amount);
        if !amount.is_positive() {
            return Err(LedgerError::validation("amount", "must be greater than zero"));
        }
        let currency = match cmd.currency.as_deref() {
            Some(code) => Currency::new(code)?,
            None => Currency::default(),
        };
        let reference = cmd
            .gateway_reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let now = Timestamp::now();
        let payment = Payment {
            id: PaymentId::new(),
            tenant_id: ctx.tenant_id,
            customer_id: cmd.customer_id,
            order_id: cmd.order_id,
            amount,
            currency,
            gateway: cmd.gateway,
            status: PaymentStatus::Pending,
            gateway_reference: reference,
            created_at: now,
            updated_at: now,
        };
        let audit = AuditEntry::record(
            ctx.actor(),
            Some(ctx.tenant_id),
            AuditAction::PaymentRecorded,
            "payment",
            payment.id,
        )
        .with_metadata(json!({
            "amount": payment.amount,
            "currency": payment.currency,
            "gateway": payment.gateway,
            "gateway_reference": payment.gateway_reference,
        }))
        .at(now);

        self.payments.create(&payment, &audit).await?;
        tracing::info!(
            tenant_id = %ctx.tenant_id,
            payment_id = %payment.id,
            gateway = %payment.gateway,
            "Payment recorded"
        );
        Ok(payment)
    }
}
