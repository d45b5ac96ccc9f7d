//! Users, tenants and memberships.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{
    AuthenticatedUser, DomainError, ErrorCode, TenantId, Timestamp, UserId,
};
use crate::domain::tenancy::{
    AccessError, MembershipStatus, Role, Tenant, TenantMembership, TenantStatus, User,
};
use crate::ports::{
    MembershipRepository, MutateFn, Mutated, TenantRepository, UserRepository,
};

use super::{apply_to_slot, InMemoryStore};

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn upsert_by_subject(&self, identity: &AuthenticatedUser) -> Result<User, DomainError> {
        let mut state = self.state.lock().await;
        let now = Timestamp::now();
        if let Some(user) = state
            .users
            .values_mut()
            .find(|u| u.auth_subject == identity.subject)
        {
            user.refresh_profile(identity, now);
            return Ok(user.clone());
        }
        let user = User::first_seen(identity, now);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl TenantRepository for InMemoryStore {
    async fn create(&self, tenant: &Tenant, audit: &AuditEntry) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        if state.tenants.values().any(|t| t.slug == tenant.slug) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("slug '{}' is already taken", tenant.slug),
            ));
        }
        state.tenants.insert(tenant.id, tenant.clone());
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError> {
        Ok(self.state.lock().await.tenants.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: TenantId,
        status: TenantStatus,
        audit: &AuditEntry,
    ) -> Result<Option<Tenant>, DomainError> {
        let mut state = self.state.lock().await;
        let Some(tenant) = state.tenants.get_mut(&id) else {
            return Ok(None);
        };
        tenant.status = status;
        tenant.updated_at = audit.created_at;
        let updated = tenant.clone();
        state.audit_log.push(audit.clone());
        Ok(Some(updated))
    }
}

#[async_trait]
impl MembershipRepository for InMemoryStore {
    async fn find(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Option<TenantMembership>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| m.tenant_id == tenant_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<TenantMembership>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.status != MembershipStatus::Removed)
            .cloned()
            .collect())
    }

    async fn is_platform_admin(&self, user_id: UserId) -> Result<bool, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .any(|m| m.user_id == user_id && m.role == Role::PlatformAdmin && m.is_active()))
    }

    async fn insert_if_absent(
        &self,
        membership: &TenantMembership,
        audit: &AuditEntry,
    ) -> Result<(TenantMembership, bool), DomainError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .memberships
            .iter()
            .find(|m| m.tenant_id == membership.tenant_id && m.user_id == membership.user_id)
        {
            return Ok((existing.clone(), false));
        }
        state.memberships.push(membership.clone());
        state.audit_log.push(audit.clone());
        Ok((membership.clone(), true))
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        apply: &MutateFn<'_, TenantMembership, Role, AccessError>,
    ) -> Result<Mutated<TenantMembership, Role>, AccessError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let slot = state
            .memberships
            .iter_mut()
            .find(|m| m.tenant_id == tenant_id && m.user_id == user_id)
            .ok_or(AccessError::MembershipNotFound { tenant_id, user_id })?;
        apply_to_slot(slot, &mut state.audit_log, apply)
    }
}
