//! Tenant and membership persistence ports.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{DomainError, TenantId, UserId};
use crate::domain::tenancy::{AccessError, Role, Tenant, TenantMembership, TenantStatus};

use super::{MutateFn, Mutated};

#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Inserts a tenant. Fails `Conflict` when the slug is taken.
    async fn create(&self, tenant: &Tenant, audit: &AuditEntry) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError>;

    /// Sets the tenant status. `Ok(None)` when the tenant does not exist.
    async fn update_status(
        &self,
        id: TenantId,
        status: TenantStatus,
        audit: &AuditEntry,
    ) -> Result<Option<Tenant>, DomainError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// The (tenant, user) membership in any status.
    async fn find(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Option<TenantMembership>, DomainError>;

    /// Every non-removed membership of a user.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<TenantMembership>, DomainError>;

    /// True if the user holds an active `platform_admin` membership in any
    /// tenant.
    async fn is_platform_admin(&self, user_id: UserId) -> Result<bool, DomainError>;

    /// Inserts the membership unless the (tenant, user) pair already has one.
    /// Returns the stored row and whether it was inserted. The audit entry is
    /// only written on insert.
    async fn insert_if_absent(
        &self,
        membership: &TenantMembership,
        audit: &AuditEntry,
    ) -> Result<(TenantMembership, bool), DomainError>;

    /// Locks the (tenant, user) membership and applies `apply`. The closure
    /// output is the role held before the change. Fails
    /// `MembershipNotFound` when the pair has no row.
    async fn modify(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        apply: &MutateFn<'_, TenantMembership, Role, AccessError>,
    ) -> Result<Mutated<TenantMembership, Role>, AccessError>;
}
