//! JoinTenantHandler - lazily creates a customer membership for the caller.
//!
//! Joining is idempotent: a caller who already has a membership gets it
//! back unchanged. Removed members cannot rejoin on their own.

use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditActor, AuditEntry};
use crate::domain::foundation::{TenantId, Timestamp, UserId};
use crate::domain::tenancy::{AccessError, MembershipStatus, TenantMembership};
use crate::ports::{MembershipRepository, TenantRepository};

#[derive(Debug, Clone)]
pub struct JoinTenantResult {
    pub membership: TenantMembership,
    pub created: bool,
}

pub struct JoinTenantHandler {
    tenants: Arc<dyn TenantRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl JoinTenantHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self {
            tenants,
            memberships,
        }
    }

    pub async fn handle(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<JoinTenantResult, AccessError> {
        let tenant = self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(AccessError::TenantNotFound(tenant_id))?;
        if !tenant.status.allows_access() {
            return Err(AccessError::NoTenantAccess { tenant_id });
        }

        let membership = TenantMembership::customer(tenant_id, user_id, Timestamp::now());
        let audit = AuditEntry::record(
            AuditActor::User(user_id),
            Some(tenant_id),
            AuditAction::MembershipJoined,
            "membership",
            membership.id,
        )
        .at(membership.created_at);

        let (membership, created) = self.memberships.insert_if_absent(&membership, &audit).await?;
        if membership.status == MembershipStatus::Removed {
            return Err(AccessError::NoTenantAccess { tenant_id });
        }
        if created {
            tracing::info!(%tenant_id, %user_id, "Customer joined tenant");
        }
        Ok(JoinTenantResult {
            membership,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::tenancy::{Role, Tenant, TenantSlug};

    async fn store_with_tenant() -> (InMemoryStore, TenantId) {
        let store = InMemoryStore::new();
        let tenant = Tenant::create(TenantSlug::new("acme").unwrap(), "Acme", "starter", Timestamp::now())
            .unwrap();
        let audit = AuditEntry::record(
            AuditActor::system("test"),
            None,
            AuditAction::TenantCreated,
            "tenant",
            tenant.id,
        );
        TenantRepository::create(&store, &tenant, &audit).await.unwrap();
        (store, tenant.id)
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let (store, tenant) = store_with_tenant().await;
        let shared = Arc::new(store.clone());
        let handler = JoinTenantHandler::new(shared.clone(), shared);
        let user = UserId::new();

        let first = handler.handle(user, tenant).await.unwrap();
        assert!(first.created);
        assert_eq!(first.membership.role, Role::Customer);

        let second = handler.handle(user, tenant).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.membership.id, first.membership.id);

        let joins = store
            .audit_entries()
            .await
            .into_iter()
            .filter(|e| e.action == AuditAction::MembershipJoined)
            .count();
        assert_eq!(joins, 1);
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let handler = JoinTenantHandler::new(store.clone(), store);
        let err = handler.handle(UserId::new(), TenantId::new()).await.unwrap_err();
        assert!(matches!(err, AccessError::TenantNotFound(_)));
    }
}
