//! GetPaymentHandler - fetch one payment by id.

use std::sync::Arc;

use crate::domain::foundation::PaymentId;
use crate::domain::ledger::LedgerError;
use crate::domain::payment::Payment;
use crate::domain::tenancy::TenantContext;
use crate::ports::PaymentRepository;

pub struct GetPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl GetPaymentHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    /// Customers only see their own payments; anyone else gets `NotFound`.
    pub async fn handle(&self, ctx: &TenantContext, id: PaymentId) -> Result<Payment, LedgerError> {
        self.payments
            .find(ctx.tenant_id, id)
            .await?
            .filter(|p| ctx.is_staff() || p.customer_id == Some(ctx.user_id))
            .ok_or(LedgerError::not_found("payment"))
    }
}
