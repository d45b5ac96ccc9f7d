//! SetTenantStatusHandler - platform command that activates or suspends a tenant.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::TenantId;
use crate::domain::tenancy::{AccessError, PlatformContext, Tenant, TenantStatus};
use crate::ports::TenantRepository;

#[derive(Debug, Clone)]
pub struct SetTenantStatusCommand {
    pub tenant_id: TenantId,
    pub status: TenantStatus,
}

pub struct SetTenantStatusHandler {
    tenants: Arc<dyn TenantRepository>,
}

impl SetTenantStatusHandler {
    pub fn new(tenants: Arc<dyn TenantRepository>) -> Self {
        Self { tenants }
    }

    pub async fn handle(
        &self,
        platform: &PlatformContext,
        cmd: SetTenantStatusCommand,
    ) -> Result<Tenant, AccessError> {
        let audit = AuditEntry::record(
            platform.actor(),
            None,
            AuditAction::TenantStatusChanged,
            "tenant",
            cmd.tenant_id,
        )
        .with_metadata(json!({ "status": cmd.status }));

        let tenant = self
            .tenants
            .update_status(cmd.tenant_id, cmd.status, &audit)
            .await?
            .ok_or(AccessError::TenantNotFound(cmd.tenant_id))?;

        tracing::info!(tenant_id = %tenant.id, status = %tenant.status, "Tenant status changed");
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let handler = SetTenantStatusHandler::new(Arc::new(InMemoryStore::new()));
        let err = handler
            .handle(
                &PlatformContext {
                    user_id: UserId::new(),
                },
                SetTenantStatusCommand {
                    tenant_id: TenantId::new(),
                    status: TenantStatus::Suspended,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::TenantNotFound(_)));
    }
}
