//! Order repository and product catalog ports.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{OrderId, ProductId, TenantId};
use crate::domain::ledger::{LedgerError, Order, OrderStatus, Product};

use super::{MutateFn, Mutated};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts the order with its item snapshots.
    async fn create(&self, order: &Order, audit: &AuditEntry) -> Result<(), LedgerError>;

    async fn find(&self, tenant_id: TenantId, id: OrderId) -> Result<Option<Order>, LedgerError>;

    /// Closure output is the status before the change.
    async fn modify(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        apply: &MutateFn<'_, Order, OrderStatus, LedgerError>,
    ) -> Result<Mutated<Order, OrderStatus>, LedgerError>;
}

/// Read-only view of a tenant's product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Products with the given ids that belong to the tenant, active or not.
    async fn find_many(
        &self,
        tenant_id: TenantId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, LedgerError>;
}
