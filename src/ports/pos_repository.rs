//! Point-of-sale transaction repository port.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{PosTransactionId, TenantId};
use crate::domain::ledger::{LedgerError, PosTransaction};

use super::{MutateFn, Mutated};

#[async_trait]
pub trait PosRepository: Send + Sync {
    /// Fails `Conflict` when the receipt number is already used.
    async fn create(&self, transaction: &PosTransaction, audit: &AuditEntry) -> Result<(), LedgerError>;

    async fn find(
        &self,
        tenant_id: TenantId,
        id: PosTransactionId,
    ) -> Result<Option<PosTransaction>, LedgerError>;

    async fn modify(
        &self,
        tenant_id: TenantId,
        id: PosTransactionId,
        apply: &MutateFn<'_, PosTransaction, (), LedgerError>,
    ) -> Result<Mutated<PosTransaction, ()>, LedgerError>;
}
