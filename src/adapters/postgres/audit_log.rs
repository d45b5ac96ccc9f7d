//! PostgreSQL implementation of AuditLogReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{DomainError, TenantId, Timestamp};
use crate::ports::AuditLogReader;

use super::tx::{audit_from_row, begin_tenant, commit, db_error};

/// PostgreSQL implementation of AuditLogReader.
#[derive(Clone)]
pub struct PostgresAuditLogReader {
    pool: PgPool,
}

impl PostgresAuditLogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogReader for PostgresAuditLogReader {
    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        before: Option<Timestamp>,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, actor_type, actor_id, action,
                   resource_type, resource_id, metadata, created_at
            FROM audit_logs
            WHERE tenant_id = $1
              AND ($2::timestamptz IS NULL OR created_at < $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(before.map(|t| t.into_datetime()))
        .bind(i64::from(limit))
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("list audit entries"))?;
        commit(tx).await?;
        rows.iter().map(audit_from_row).collect()
    }
}
