//! AcceptInvitationHandler - the invited user activates their membership.

use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditActor, AuditEntry};
use crate::domain::foundation::{TenantId, Timestamp, UserId};
use crate::domain::tenancy::{AccessError, TenantMembership};
use crate::ports::{MembershipRepository, Mutation};

pub struct AcceptInvitationHandler {
    memberships: Arc<dyn MembershipRepository>,
}

impl AcceptInvitationHandler {
    pub fn new(memberships: Arc<dyn MembershipRepository>) -> Self {
        Self { memberships }
    }

    pub async fn handle(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<TenantMembership, AccessError> {
        let mutated = self
            .memberships
            .modify(tenant_id, user_id, &|membership| {
                let now = Timestamp::now();
                membership.accept(now)?;
                let audit = AuditEntry::record(
                    AuditActor::User(user_id),
                    Some(tenant_id),
                    AuditAction::MembershipAccepted,
                    "membership",
                    membership.id,
                )
                .at(now);
                Ok(Mutation::audited(membership.role, audit))
            })
            .await?;
        tracing::info!(%tenant_id, %user_id, role = %mutated.entity.role, "Invitation accepted");
        Ok(mutated.entity)
    }
}
