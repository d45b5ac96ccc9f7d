//! Voucher repository port.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{TenantId, VoucherId};
use crate::domain::ledger::{LedgerError, Voucher, VoucherRedemption};

use super::{MutateFn, Mutated};

#[async_trait]
pub trait VoucherRepository: Send + Sync {
    /// Fails `Conflict` when the code is already used in the tenant.
    async fn create(&self, voucher: &Voucher, audit: &AuditEntry) -> Result<(), LedgerError>;

    async fn find(&self, tenant_id: TenantId, id: VoucherId) -> Result<Option<Voucher>, LedgerError>;

    async fn redemptions(
        &self,
        tenant_id: TenantId,
        id: VoucherId,
    ) -> Result<Vec<VoucherRedemption>, LedgerError>;

    /// Locks the voucher and applies `apply`. The counter update and the
    /// returned redemption row commit together.
    async fn modify(
        &self,
        tenant_id: TenantId,
        id: VoucherId,
        apply: &MutateFn<'_, Voucher, Option<VoucherRedemption>, LedgerError>,
    ) -> Result<Mutated<Voucher, Option<VoucherRedemption>>, LedgerError>;
}
