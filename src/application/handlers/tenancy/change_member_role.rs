//! ChangeMemberRoleHandler - admin elevates or demotes a member.
//!
//! The role change commits with its audit row first. The realtime
//! notification and the identity provider mirror run afterwards and can
//! only log on failure.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, Timestamp, UserId};
use crate::domain::tenancy::{
    AccessError, MembershipRoleChanged, MembershipStatus, Role, TenantContext, TenantMembership,
};
use crate::ports::{IdentityProviderMirror, MembershipRepository, Mutation, UserRepository};

#[derive(Debug, Clone)]
pub struct ChangeMemberRoleCommand {
    pub user_id: UserId,
    pub role: Role,
}

pub struct ChangeMemberRoleHandler {
    memberships: Arc<dyn MembershipRepository>,
    users: Arc<dyn UserRepository>,
    mirror: Arc<dyn IdentityProviderMirror>,
    notifier: Notifier,
}

impl ChangeMemberRoleHandler {
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        users: Arc<dyn UserRepository>,
        mirror: Arc<dyn IdentityProviderMirror>,
        notifier: Notifier,
    ) -> Self {
        Self {
            memberships,
            users,
            mirror,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: ChangeMemberRoleCommand,
    ) -> Result<TenantMembership, AccessError> {
        ctx.require_role(&[Role::Admin])?;
        if cmd.role == Role::PlatformAdmin {
            if !self.memberships.is_platform_admin(ctx.user_id).await? {
                return Err(AccessError::NotPlatformAdmin);
            }
        } else if cmd.role.rank() > ctx.role.rank() {
            return Err(AccessError::CannotGrantRole { role: cmd.role });
        }

        let caller = *ctx;
        let new_role = cmd.role;
        let mutated = self
            .memberships
            .modify(ctx.tenant_id, cmd.user_id, &|membership| {
                if membership.status == MembershipStatus::Removed {
                    return Err(AccessError::invalid_state("removed", "change the role of"));
                }
                if membership.role.rank() > caller.role.rank() {
                    return Err(AccessError::InsufficientRole {
                        required: membership.role,
                        actual: caller.role,
                    });
                }
                if membership.role == new_role {
                    return Ok(Mutation::unchanged(new_role));
                }
                let now = Timestamp::now();
                let previous = membership.change_role(new_role, now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::MembershipRoleChanged,
                    "membership",
                    membership.id,
                )
                .with_metadata(json!({
                    "user_id": membership.user_id,
                    "previous_role": previous,
                    "new_role": new_role,
                }))
                .at(now);
                Ok(Mutation::audited(previous, audit))
            })
            .await?;

        if !mutated.written {
            return Ok(mutated.entity);
        }

        let membership = mutated.entity;
        let previous_role = mutated.child;
        tracing::info!(
            tenant_id = %membership.tenant_id,
            user_id = %membership.user_id,
            %previous_role,
            new_role = %membership.role,
            "Member role changed"
        );

        self.notifier
            .notify(&MembershipRoleChanged {
                event_id: EventId::new(),
                tenant_id: membership.tenant_id,
                membership_id: membership.id,
                user_id: membership.user_id,
                previous_role,
                new_role: membership.role,
                changed_by: ctx.user_id,
                occurred_at: membership.updated_at,
            })
            .await;

        self.spawn_mirror(&membership);
        Ok(membership)
    }

    fn spawn_mirror(&self, membership: &TenantMembership) {
        let users = self.users.clone();
        let mirror = self.mirror.clone();
        let user_id = membership.user_id;
        let tenant_id = membership.tenant_id;
        let role = membership.role;
        tokio::spawn(async move {
            let subject = match users.find_by_id(user_id).await {
                Ok(Some(user)) => user.auth_subject,
                Ok(None) => {
                    tracing::warn!(%user_id, "Role mirror skipped: user not found");
                    return;
                }
                Err(error) => {
                    tracing::warn!(%user_id, %error, "Role mirror skipped: user lookup failed");
                    return;
                }
            };
            if let Err(error) = mirror.sync_role(&subject, tenant_id, role).await {
                tracing::warn!(%user_id, %tenant_id, %role, %error, "Identity provider role mirror failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::identity::NoopIdentityMirror;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct RecordingMirror {
        tx: mpsc::UnboundedSender<(String, TenantId, Role)>,
        fail: bool,
    }

    #[async_trait]
    impl IdentityProviderMirror for RecordingMirror {
        async fn sync_role(&self, subject: &str, tenant_id: TenantId, role: Role) -> Result<(), DomainError> {
            let _ = self.tx.send((subject.to_string(), tenant_id, role));
            if self.fail {
                Err(DomainError::new(ErrorCode::ExternalServiceError, "idp down"))
            } else {
                Ok(())
            }
        }
    }

    fn handler(
        store: &InMemoryStore,
        bus: &InMemoryEventBus,
        mirror: Arc<dyn IdentityProviderMirror>,
    ) -> ChangeMemberRoleHandler {
        ChangeMemberRoleHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            mirror,
            Notifier::new(Arc::new(bus.clone())),
        )
    }

    #[tokio::test]
    async fn promotes_audits_notifies_and_mirrors() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let customer = seed_member(&store, tenant, Role::Customer).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let membership = handler(&store, &bus, Arc::new(RecordingMirror { tx, fail: true }))
            .handle(
                &admin,
                ChangeMemberRoleCommand {
                    user_id: customer.user_id,
                    role: Role::Staff,
                },
            )
            .await
            .unwrap();

        assert_eq!(membership.role, Role::Staff);
        assert!(bus.has_event("membership.role_changed.v1"));
        let audit = store.audit_entries().await;
        assert!(audit.iter().any(|e| e.action == AuditAction::MembershipRoleChanged));

        let (_, mirrored_tenant, mirrored_role) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirrored_tenant, tenant);
        assert_eq!(mirrored_role, Role::Staff);
    }

    #[tokio::test]
    async fn same_role_writes_nothing() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let before = store.audit_entries().await.len();

        handler(&store, &bus, Arc::new(NoopIdentityMirror))
            .handle(
                &admin,
                ChangeMemberRoleCommand {
                    user_id: staff.user_id,
                    role: Role::Staff,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.audit_entries().await.len(), before);
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn granting_platform_admin_requires_platform_admin() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;

        let err = handler(&store, &bus, Arc::new(NoopIdentityMirror))
            .handle(
                &admin,
                ChangeMemberRoleCommand {
                    user_id: staff.user_id,
                    role: Role::PlatformAdmin,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotPlatformAdmin));
    }

    #[tokio::test]
    async fn cannot_demote_a_higher_ranked_member() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let owner = seed_member(&store, tenant, Role::PlatformAdmin).await;

        let err = handler(&store, &bus, Arc::new(NoopIdentityMirror))
            .handle(
                &admin,
                ChangeMemberRoleCommand {
                    user_id: owner.user_id,
                    role: Role::Customer,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InsufficientRole { .. }));
    }
}
