//! Identity provider mirror port.
//!
//! Pushes local role changes to the external identity provider so role
//! claims in newly issued tokens match the membership table. Calls are best
//! effort and never gate the local change.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::tenancy::Role;

#[async_trait]
pub trait IdentityProviderMirror: Send + Sync {
    async fn sync_role(
        &self,
        auth_subject: &str,
        tenant_id: TenantId,
        role: Role,
    ) -> Result<(), DomainError>;
}
