//! RemoveMemberHandler - admin removes a member from the tenant.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::tenancy::{AccessError, Role, TenantContext, TenantMembership};
use crate::ports::{MembershipRepository, Mutation};

pub struct RemoveMemberHandler {
    memberships: Arc<dyn MembershipRepository>,
}

impl RemoveMemberHandler {
    pub fn new(memberships: Arc<dyn MembershipRepository>) -> Self {
        Self { memberships }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        user_id: UserId,
    ) -> Result<TenantMembership, AccessError> {
        ctx.require_role(&[Role::Admin])?;
        let caller = *ctx;
        let mutated = self
            .memberships
            .modify(ctx.tenant_id, user_id, &|membership| {
                if membership.role.rank() > caller.role.rank() {
                    return Err(AccessError::InsufficientRole {
                        required: membership.role,
                        actual: caller.role,
                    });
                }
                let now = Timestamp::now();
                membership.remove(now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::MembershipRemoved,
                    "membership",
                    membership.id,
                )
                .with_metadata(json!({ "user_id": membership.user_id, "role": membership.role }))
                .at(now);
                Ok(Mutation::audited(membership.role, audit))
            })
            .await?;
        tracing::info!(tenant_id = %ctx.tenant_id, %user_id, "Member removed");
        Ok(mutated.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::application::AccessGate;
    use crate::domain::tenancy::MembershipStatus;

    #[tokio::test]
    async fn removed_member_loses_access() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;

        let membership = RemoveMemberHandler::new(Arc::new(store.clone()))
            .handle(&admin, staff.user_id)
            .await
            .unwrap();
        assert_eq!(membership.status, MembershipStatus::Removed);

        let gate = AccessGate::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let err = gate.authorize(staff.user_id, tenant, &[]).await.unwrap_err();
        assert!(matches!(err, AccessError::NoTenantAccess { .. }));
    }

    #[tokio::test]
    async fn removing_twice_is_invalid_state() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let handler = RemoveMemberHandler::new(Arc::new(store.clone()));

        handler.handle(&admin, staff.user_id).await.unwrap();
        let err = handler.handle(&admin, staff.user_id).await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidMembershipState { .. }));
    }
}
