//! Gift card repository port.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{GiftCardId, TenantId};
use crate::domain::ledger::{GiftCard, GiftCardCode, GiftCardTransaction, LedgerError};

use super::{MutateFn, Mutated};

#[async_trait]
pub trait GiftCardRepository: Send + Sync {
    /// Inserts a new card with its purchase row. Fails `Conflict` when the
    /// code is already used in the tenant.
    async fn issue(
        &self,
        card: &GiftCard,
        purchase: &GiftCardTransaction,
        audit: &AuditEntry,
    ) -> Result<(), LedgerError>;

    async fn find_by_code(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
    ) -> Result<Option<GiftCard>, LedgerError>;

    /// Ledger rows of a card, oldest first.
    async fn history(
        &self,
        tenant_id: TenantId,
        card_id: GiftCardId,
    ) -> Result<Vec<GiftCardTransaction>, LedgerError>;

    /// Locks the card and applies `apply`. A returned transaction row is
    /// appended in the same unit of work.
    async fn modify(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
        apply: &MutateFn<'_, GiftCard, Option<GiftCardTransaction>, LedgerError>,
    ) -> Result<Mutated<GiftCard, Option<GiftCardTransaction>>, LedgerError>;

    /// Locks the card, asks `audit_for` for the deletion entry (which may
    /// refuse), then deletes the card and its ledger rows. The audit row
    /// outlives the card.
    async fn delete(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
        audit_for: &(dyn for<'g> Fn(&'g GiftCard) -> Result<AuditEntry, LedgerError> + Send + Sync),
    ) -> Result<GiftCard, LedgerError>;
}
