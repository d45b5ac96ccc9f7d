use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::tenancy::Role;
use crate::ports::IdentityProviderMirror;

/// Accepts every role change and does nothing with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIdentityMirror;

#[async_trait]
impl IdentityProviderMirror for NoopIdentityMirror {
    async fn sync_role(
        &self,
        auth_subject: &str,
        tenant_id: TenantId,
        role: Role,
    ) -> Result<(), DomainError> {
        tracing::debug!(%auth_subject, %tenant_id, role = role.as_str(), "Identity mirror disabled");
        Ok(())
    }
}
