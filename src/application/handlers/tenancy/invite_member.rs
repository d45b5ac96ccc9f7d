//! InviteMemberHandler - admin invites an existing user as staff or admin.
//!
//! The invited role may not exceed the inviter's. A previously removed
//! member is re-invited in place so the (tenant, user) pair stays unique.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::tenancy::{AccessError, MembershipStatus, Role, TenantContext, TenantMembership};
use crate::ports::{MembershipRepository, Mutation, UserRepository};

#[derive(Debug, Clone)]
pub struct InviteMemberCommand {
    pub user_id: UserId,
    pub role: Role,
}

pub struct InviteMemberHandler {
    users: Arc<dyn UserRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl InviteMemberHandler {
    pub fn new(users: Arc<dyn UserRepository>, memberships: Arc<dyn MembershipRepository>) -> Self {
        Self { users, memberships }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: InviteMemberCommand,
    ) -> Result<TenantMembership, AccessError> {
        ctx.require_role(&[Role::Admin])?;
        if cmd.role.rank() > ctx.role.rank() {
            return Err(AccessError::CannotGrantRole { role: cmd.role });
        }
        self.users
            .find_by_id(cmd.user_id)
            .await?
            .ok_or(AccessError::UserNotFound(cmd.user_id))?;

        let now = Timestamp::now();
        let invitation =
            TenantMembership::invitation(ctx.tenant_id, cmd.user_id, cmd.role, ctx.user_id, now);
        let audit = AuditEntry::record(
            ctx.actor(),
            Some(ctx.tenant_id),
            AuditAction::MembershipInvited,
            "membership",
            invitation.id,
        )
        .with_metadata(json!({ "user_id": cmd.user_id, "role": cmd.role }))
        .at(now);

        let (existing, created) = self.memberships.insert_if_absent(&invitation, &audit).await?;
        if created {
            tracing::info!(tenant_id = %ctx.tenant_id, user_id = %cmd.user_id, role = %cmd.role, "Member invited");
            return Ok(existing);
        }
        if existing.status != MembershipStatus::Removed {
            return Err(AccessError::Conflict(format!(
                "user {} is already a member of this tenant",
                cmd.user_id
            )));
        }

        let tenant_id = ctx.tenant_id;
        let inviter = ctx.user_id;
        let actor = ctx.actor();
        let role = cmd.role;
        let mutated = self
            .memberships
            .modify(tenant_id, cmd.user_id, &|membership| {
                let now = Timestamp::now();
                membership.reinvite(role, inviter, now)?;
                let audit = AuditEntry::record(
                    actor.clone(),
                    Some(tenant_id),
                    AuditAction::MembershipInvited,
                    "membership",
                    membership.id,
                )
                .with_metadata(json!({ "user_id": membership.user_id, "role": role, "reinvited": true }))
                .at(now);
                Ok(Mutation::audited(membership.role, audit))
            })
            .await?;
        tracing::info!(%tenant_id, user_id = %cmd.user_id, %role, "Removed member re-invited");
        Ok(mutated.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant, seed_user};

    fn handler(store: &InMemoryStore) -> InviteMemberHandler {
        InviteMemberHandler::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn admin_invites_staff() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let invitee = seed_user(&store, "invitee").await;

        let membership = handler(&store)
            .handle(
                &admin,
                InviteMemberCommand {
                    user_id: invitee,
                    role: Role::Staff,
                },
            )
            .await
            .unwrap();
        assert_eq!(membership.status, MembershipStatus::Invited);
        assert_eq!(membership.invited_by, Some(admin.user_id));
    }

    #[tokio::test]
    async fn cannot_invite_above_own_role() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let invitee = seed_user(&store, "invitee").await;

        let err = handler(&store)
            .handle(
                &admin,
                InviteMemberCommand {
                    user_id: invitee,
                    role: Role::PlatformAdmin,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::CannotGrantRole { .. }));
    }

    #[tokio::test]
    async fn staff_cannot_invite() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let invitee = seed_user(&store, "invitee").await;

        let err = handler(&store)
            .handle(
                &staff,
                InviteMemberCommand {
                    user_id: invitee,
                    role: Role::Staff,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InsufficientRole { .. }));
    }

    #[tokio::test]
    async fn existing_member_conflicts() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;

        let err = handler(&store)
            .handle(
                &admin,
                InviteMemberCommand {
                    user_id: staff.user_id,
                    role: Role::Staff,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;

        let err = handler(&store)
            .handle(
                &admin,
                InviteMemberCommand {
                    user_id: UserId::new(),
                    role: Role::Staff,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::UserNotFound(_)));
    }
}
