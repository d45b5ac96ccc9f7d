//! Fixtures shared by handler tests.

use crate::adapters::memory::InMemoryStore;
use crate::domain::audit::{AuditAction, AuditActor, AuditEntry};
use crate::domain::foundation::{AuthenticatedUser, TenantId, Timestamp, UserId};
use crate::domain::tenancy::{Role, Tenant, TenantContext, TenantMembership, TenantSlug};
use crate::ports::{TenantRepository, UserRepository};

/// Creates a trial tenant with a unique slug.
pub async fn seed_tenant(store: &InMemoryStore) -> TenantId {
    let slug = TenantSlug::new(format!("tenant-{}", TenantId::new())).unwrap();
    let tenant = Tenant::create(slug, "Test Tenant", "starter", Timestamp::now()).unwrap();
    let audit = AuditEntry::record(
        AuditActor::system("fixture"),
        None,
        AuditAction::TenantCreated,
        "tenant",
        tenant.id,
    );
    TenantRepository::create(store, &tenant, &audit).await.unwrap();
    tenant.id
}

/// Creates a user record for a fresh subject.
pub async fn seed_user(store: &InMemoryStore, name: &str) -> UserId {
    let subject = format!("{}-{}", name, UserId::new());
    let identity = AuthenticatedUser::new(subject, format!("{}@example.com", name), None, true);
    store.upsert_by_subject(&identity).await.unwrap().id
}

/// Creates a user with an active membership at `role` and returns the
/// context the access gate would produce for them.
pub async fn seed_member(store: &InMemoryStore, tenant_id: TenantId, role: Role) -> TenantContext {
    let user_id = seed_user(store, role.as_str()).await;
    let mut membership = TenantMembership::customer(tenant_id, user_id, Timestamp::now());
    membership.role = role;
    store.put_membership(membership).await;
    TenantContext::new(tenant_id, user_id, role)
}
