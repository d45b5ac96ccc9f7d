//! The set of repository ports a running service is wired with.

use std::sync::Arc;

use crate::ports::{
    AuditLogReader, GiftCardRepository, MembershipRepository, OrderRepository, PaymentRepository,
    PosRepository, ProductCatalog, SessionRepository, SubscriptionRepository, TenantRepository,
    UserRepository, VoucherRepository,
};

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub gift_cards: Arc<dyn GiftCardRepository>,
    pub vouchers: Arc<dyn VoucherRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub pos: Arc<dyn PosRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub payments: Arc<dyn PaymentRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub audit_log: Arc<dyn AuditLogReader>,
}
