//! GetPosTransactionHandler - fetch one sale by id.

use std::sync::Arc;

use crate::domain::foundation::PosTransactionId;
use crate::domain::ledger::{LedgerError, PosTransaction};
use crate::domain::tenancy::TenantContext;
use crate::ports::PosRepository;

pub struct GetPosTransactionHandler {
    transactions: Arc<dyn PosRepository>,
}

impl GetPosTransactionHandler {
    pub fn new(transactions: Arc<dyn PosRepository>) -> Self {
        Self { transactions }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        id: PosTransactionId,
    ) -> Result<PosTransaction, LedgerError> {
        self.transactions
            .find(ctx.tenant_id, id)
            .await?
            .ok_or(LedgerError::not_found("pos_transaction"))
    }
}
