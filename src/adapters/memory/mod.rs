//! In-memory persistence adapter.
//!
//! One [`InMemoryStore`] implements every repository port over a single
//! state struct behind one async mutex. Each port call holds the lock for
//! its whole unit of work, so the read-validate-write sequence of a ledger
//! mutation cannot interleave with another caller, and a failed closure
//! leaves the state untouched because work happens on a copy.
//!
//! Used by the test suites and for local runs without Postgres.

mod ledger;
mod payments;
mod tenancy;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::Repositories;
use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{
    GiftCardId, OrderId, PaymentId, PosTransactionId, ProductId, SessionCreditId,
    SessionPackageId, SubscriptionId, TenantId, UserId, VoucherId,
};
use crate::domain::ledger::{
    GiftCard, GiftCardTransaction, Order, PosTransaction, Product, SessionCredit, SessionLog,
    SessionPackage, Voucher, VoucherRedemption,
};
use crate::domain::payment::{Payment, Subscription};
use crate::domain::tenancy::{Tenant, TenantMembership, User};
use crate::ports::{MutateFn, Mutated};

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    users: HashMap<UserId, User>,
    tenants: HashMap<TenantId, Tenant>,
    memberships: Vec<TenantMembership>,
    gift_cards: HashMap<GiftCardId, GiftCard>,
    gift_card_transactions: Vec<GiftCardTransaction>,
    vouchers: HashMap<VoucherId, Voucher>,
    voucher_redemptions: Vec<VoucherRedemption>,
    session_packages: HashMap<SessionPackageId, SessionPackage>,
    session_credits: HashMap<SessionCreditId, SessionCredit>,
    session_logs: Vec<SessionLog>,
    pos_transactions: HashMap<PosTransactionId, PosTransaction>,
    orders: HashMap<OrderId, Order>,
    products: HashMap<ProductId, Product>,
    payments: HashMap<PaymentId, Payment>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    audit_log: Vec<AuditEntry>,
}

/// Shared in-memory store. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every repository port backed by this one store.
    pub fn repositories(&self) -> Repositories {
        let store = Arc::new(self.clone());
        Repositories {
            users: store.clone(),
            tenants: store.clone(),
            memberships: store.clone(),
            gift_cards: store.clone(),
            vouchers: store.clone(),
            sessions: store.clone(),
            pos: store.clone(),
            orders: store.clone(),
            catalog: store.clone(),
            payments: store.clone(),
            subscriptions: store.clone(),
            audit_log: store,
        }
    }

    /// Adds or replaces a catalog product.
    pub async fn put_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    /// Inserts a membership directly, bypassing invitation flow. Used to
    /// provision platform administrators and test fixtures.
    pub async fn put_membership(&self, membership: TenantMembership) {
        let mut state = self.state.lock().await;
        state
            .memberships
            .retain(|m| !(m.tenant_id == membership.tenant_id && m.user_id == membership.user_id));
        state.memberships.push(membership);
    }

    /// Every audit entry in insertion order.
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.lock().await.audit_log.clone()
    }

    /// Every session log in insertion order.
    pub async fn session_logs(&self) -> Vec<SessionLog> {
        self.state.lock().await.session_logs.clone()
    }
}

/// Runs `apply` against a copy of `slot`. The copy replaces the stored
/// value only when the closure succeeds with an audit entry, which is then
/// appended to `audit_log`.
fn apply_to_slot<T: Clone, C, E>(
    slot: &mut T,
    audit_log: &mut Vec<AuditEntry>,
    apply: &MutateFn<'_, T, C, E>,
) -> Result<Mutated<T, C>, E> {
    let mut working = slot.clone();
    let mutation = apply(&mut working)?;
    match mutation.audit {
        Some(audit) => {
            *slot = working.clone();
            audit_log.push(audit);
            Ok(Mutated {
                entity: working,
                child: mutation.child,
                written: true,
            })
        }
        None => Ok(Mutated {
            entity: slot.clone(),
            child: mutation.child,
            written: false,
        }),
    }
}
