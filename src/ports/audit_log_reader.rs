//! Audit log read port.
//!
//! Audit entries are only written by the repository call that performs the
//! mutation they describe.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{DomainError, TenantId, Timestamp};

#[async_trait]
pub trait AuditLogReader: Send + Sync {
    /// Newest first, strictly older than `before` when given.
    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        before: Option<Timestamp>,
    ) -> Result<Vec<AuditEntry>, DomainError>;
}
