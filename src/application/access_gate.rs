//! Tenant access gate.
//!
//! Turns (caller, tenant, allowed roles) into a [`TenantContext`]. The
//! (tenant, user) membership row is the only authorization source: it must
//! exist, be active, and belong to a tenant that is not suspended. Missing
//! tenant and missing membership are reported the same way so a caller
//! cannot probe for tenant ids.

use std::sync::Arc;

use crate::domain::foundation::{TenantId, UserId};
use crate::domain::tenancy::{require_role, AccessError, PlatformContext, Role, TenantContext};
use crate::ports::{MembershipRepository, TenantRepository};

#[derive(Clone)]
pub struct AccessGate {
    tenants: Arc<dyn TenantRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl AccessGate {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        memberships: Arc<dyn MembershipRepository>,
    ) -> Self {
        Self {
            tenants,
            memberships,
        }
    }

    /// Resolves the caller's role in `tenant_id` and checks it against
    /// `allowed`. An empty `allowed` admits any active member.
    pub async fn authorize(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        allowed: &[Role],
    ) -> Result<TenantContext, AccessError> {
        let membership = self
            .memberships
            .find(tenant_id, user_id)
            .await?
            .filter(|m| m.is_active())
            .ok_or(AccessError::NoTenantAccess { tenant_id })?;

        let tenant = self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(AccessError::NoTenantAccess { tenant_id })?;
        if !tenant.status.allows_access() {
            tracing::debug!(%tenant_id, %user_id, "Access to suspended tenant refused");
            return Err(AccessError::NoTenantAccess { tenant_id });
        }

        require_role(membership.role, allowed)?;
        Ok(TenantContext::new(tenant_id, user_id, membership.role))
    }

    /// Passes when the user holds an active `platform_admin` membership in
    /// any tenant.
    pub async fn require_platform_admin(
        &self,
        user_id: UserId,
    ) -> Result<PlatformContext, AccessError> {
        if self.memberships.is_platform_admin(user_id).await? {
            Ok(PlatformContext { user_id })
        } else {
            Err(AccessError::NotPlatformAdmin)
        }
    }
}
