//! Resolved tenant context for one request.

use crate::domain::audit::AuditActor;
use crate::domain::foundation::{TenantId, UserId};

use super::{require_role, AccessError, Role};

/// Output of the tenant access gate: who is acting, on which tenant, with
/// which role. Every tenant-scoped operation takes one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub role: Role,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId, user_id: UserId, role: Role) -> Self {
        Self {
            tenant_id,
            user_id,
            role,
        }
    }

    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AccessError> {
        require_role(self.role, allowed)
    }

    pub fn is_staff(&self) -> bool {
        self.role.at_least(Role::Staff)
    }

    pub fn actor(&self) -> AuditActor {
        AuditActor::User(self.user_id)
    }
}

/// Proof that the caller passed the platform-admin check.
///
/// Platform operations are not scoped to a tenant, so their audit rows carry
/// no tenant id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformContext {
    pub user_id: UserId,
}

impl PlatformContext {
    pub fn actor(&self) -> AuditActor {
        AuditActor::User(self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_enforces_role_floor() {
        let ctx = TenantContext::new(TenantId::new(), UserId::new(), Role::Staff);
        assert!(ctx.require_role(&[Role::Staff]).is_ok());
        assert!(ctx.require_role(&[Role::Admin]).is_err());
        assert!(ctx.is_staff());
    }

    #[test]
    fn actor_is_the_calling_user() {
        let user = UserId::new();
        let ctx = TenantContext::new(TenantId::new(), user, Role::Customer);
        assert_eq!(ctx.actor(), AuditActor::User(user));
        assert!(!ctx.is_staff());
    }
}
