//! CreateTenantHandler - platform command that opens a new tenant.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::Timestamp;
use crate::domain::tenancy::{AccessError, PlatformContext, Tenant, TenantSlug};
use crate::ports::TenantRepository;

const DEFAULT_PLAN: &str = "starter";

#[derive(Debug, Clone)]
pub struct CreateTenantCommand {
    pub slug: String,
    pub name: String,
    pub plan: Option<String>,
}

pub struct CreateTenantHandler {
    tenants: Arc<dyn TenantRepository>,
}

impl CreateTenantHandler {
    pub fn new(tenants: Arc<dyn TenantRepository>) -> Self {
        Self { tenants }
    }

    pub async fn handle(
        &self,
        platform: &PlatformContext,
        cmd: CreateTenantCommand,
    ) -> Result<Tenant, AccessError> {
        let slug = TenantSlug::new(cmd.slug).map_err(|e| AccessError::validation(e.field(), e.to_string()))?;
        let plan = cmd.plan.unwrap_or_else(|| DEFAULT_PLAN.to_string());
        let tenant = Tenant::create(slug, cmd.name, plan, Timestamp::now())
            .map_err(|e| AccessError::validation(e.field(), e.to_string()))?;

        let audit = AuditEntry::record(
            platform.actor(),
            None,
            AuditAction::TenantCreated,
            "tenant",
            tenant.id,
        )
        .with_metadata(json!({ "slug": tenant.slug, "plan": tenant.plan }))
        .at(tenant.created_at);

        self.tenants.create(&tenant, &audit).await?;
        tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant created");
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::UserId;
    use crate::domain::tenancy::TenantStatus;

    fn platform() -> PlatformContext {
        PlatformContext {
            user_id: UserId::new(),
        }
    }

    #[tokio::test]
    async fn creates_trial_tenant_with_platform_audit() {
        let store = InMemoryStore::new();
        let handler = CreateTenantHandler::new(Arc::new(store.clone()));

        let tenant = handler
            .handle(
                &platform(),
                CreateTenantCommand {
                    slug: "acme-fit".into(),
                    name: "Acme Fitness".into(),
                    plan: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(tenant.status, TenantStatus::Trial);
        assert_eq!(tenant.plan, "starter");
        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::TenantCreated);
        assert!(audit[0].tenant_id.is_none());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let handler = CreateTenantHandler::new(Arc::new(InMemoryStore::new()));
        let cmd = CreateTenantCommand {
            slug: "acme".into(),
            name: "Acme".into(),
            plan: None,
        };
        handler.handle(&platform(), cmd.clone()).await.unwrap();
        let err = handler.handle(&platform(), cmd).await.unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected() {
        let handler = CreateTenantHandler::new(Arc::new(InMemoryStore::new()));
        let err = handler
            .handle(
                &platform(),
                CreateTenantCommand {
                    slug: "Bad Slug".into(),
                    name: "Acme".into(),
                    plan: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::ValidationFailed { .. }));
    }
}
