//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! Every tenant-scoped statement runs inside a transaction that first sets
//! `app.current_tenant_id`, so row-level security filters rows even if a
//! query forgets its `tenant_id` predicate. Ledger mutations lock their row
//! with `SELECT .. FOR UPDATE` and write the audit entry before commit.

mod audit_log;
mod gift_cards;
mod orders;
mod payments;
mod pos;
mod sessions;
mod tenancy;
mod tx;
mod vouchers;

pub use audit_log::PostgresAuditLogReader;
pub use gift_cards::PostgresGiftCardRepository;
pub use orders::{PostgresOrderRepository, PostgresProductCatalog};
pub use payments::{PostgresPaymentRepository, PostgresSubscriptionRepository};
pub use pos::PostgresPosRepository;
pub use sessions::PostgresSessionRepository;
pub use tenancy::{PostgresMembershipRepository, PostgresTenantRepository, PostgresUserRepository};
pub use vouchers::PostgresVoucherRepository;

/// Embedded schema migrations.
use std::sync::Arc;

use sqlx::PgPool;

use crate::application::Repositories;

/// Every repository port backed by `pool`.
pub fn repositories(pool: PgPool) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        tenants: Arc::new(PostgresTenantRepository::new(pool.clone())),
        memberships: Arc::new(PostgresMembershipRepository::new(pool.clone())),
        gift_cards: Arc::new(PostgresGiftCardRepository::new(pool.clone())),
        vouchers: Arc::new(PostgresVoucherRepository::new(pool.clone())),
        sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
        pos: Arc::new(PostgresPosRepository::new(pool.clone())),
        orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
        catalog: Arc::new(PostgresProductCatalog::new(pool.clone())),
        payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        audit_log: Arc::new(PostgresAuditLogReader::new(pool)),
    }
}

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
