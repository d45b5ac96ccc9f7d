//! ListAuditLogHandler - admin reads the tenant's audit trail, newest first.

use std::sync::Arc;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::tenancy::TenantContext;
use crate::ports::AuditLogReader;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, Default)]
pub struct ListAuditLogQuery {
    pub limit: Option<u32>,
    /// Cursor: only entries strictly older than this.
    pub before: Option<Timestamp>,
}

pub struct ListAuditLogHandler {
    reader: Arc<dyn AuditLogReader>,
}

impl ListAuditLogHandler {
    pub fn new(reader: Arc<dyn AuditLogReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        query: ListAuditLogQuery,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        self.reader.list(ctx.tenant_id, limit, query.before).await
    }
}
