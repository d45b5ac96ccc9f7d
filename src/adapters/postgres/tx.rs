//! Transaction helpers shared by the Postgres repositories.
//!
//! Row-level security policies read `app.current_tenant_id` and
//! `app.bypass_rls`. Both are set with `set_config(.., true)` so they are
//! scoped to the transaction and never leak to the next user of a pooled
//! connection.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::audit::{AuditAction, AuditActor, AuditEntry};
use crate::domain::foundation::{AuditLogId, DomainError, ErrorCode, TenantId, Timestamp};

pub(crate) type PgTx = Transaction<'static, Postgres>;

/// Opens a transaction scoped to one tenant.
pub(crate) async fn begin_tenant(pool: &PgPool, tenant_id: TenantId) -> Result<PgTx, DomainError> {
    let mut tx = pool.begin().await.map_err(db_error("begin transaction"))?;
    sqlx::query("SELECT set_config('app.current_tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_error("set tenant context"))?;
    Ok(tx)
}

/// Opens a transaction that sees every tenant. Used for webhook
/// reconciliation, platform operations and cross-tenant lookups of the
/// caller's own memberships.
pub(crate) async fn begin_system(pool: &PgPool) -> Result<PgTx, DomainError> {
    let mut tx = pool.begin().await.map_err(db_error("begin transaction"))?;
    sqlx::query("SELECT set_config('app.bypass_rls', 'on', true)")
        .execute(&mut *tx)
        .await
        .map_err(db_error("set system context"))?;
    Ok(tx)
}

pub(crate) async fn commit(tx: PgTx) -> Result<(), DomainError> {
    tx.commit().await.map_err(db_error("commit"))
}

pub(crate) async fn insert_audit(tx: &mut PgTx, entry: &AuditEntry) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (
            id, tenant_id, actor_type, actor_id, action,
            resource_type, resource_id, metadata, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.tenant_id.map(|t| *t.as_uuid()))
    .bind(entry.actor.actor_type())
    .bind(entry.actor.identity())
    .bind(entry.action.as_str())
    .bind(&entry.resource_type)
    .bind(&entry.resource_id)
    .bind(&entry.metadata)
    .bind(entry.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("insert audit entry"))?;
    Ok(())
}

pub(crate) fn audit_from_row(row: &PgRow) -> Result<AuditEntry, DomainError> {
    let actor_type: String = col(row, "actor_type")?;
    let actor_id: String = col(row, "actor_id")?;
    let action: String = col(row, "action")?;
    Ok(AuditEntry {
        id: AuditLogId::from_uuid(col(row, "id")?),
        actor: AuditActor::from_parts(&actor_type, &actor_id),
        tenant_id: col::<Option<uuid::Uuid>>(row, "tenant_id")?.map(TenantId::from_uuid),
        action: AuditAction::from(action),
        resource_type: col(row, "resource_type")?,
        resource_id: col(row, "resource_id")?,
        metadata: col(row, "metadata")?,
        created_at: ts(row, "created_at")?,
    })
}

/// Maps a sqlx failure to a domain error. Unique violations become
/// `Conflict`; everything else is a database error.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                let what = db.constraint().unwrap_or("unique constraint").to_string();
                return DomainError::new(ErrorCode::Conflict, format!("{} violates {}", context, what));
            }
        }
        DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", context, err))
    }
}

pub(crate) fn col<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(format!("Failed to decode column {}: {}", name, e)))
}

pub(crate) fn ts(row: &PgRow, name: &str) -> Result<Timestamp, DomainError> {
    col::<chrono::DateTime<chrono::Utc>>(row, name).map(Timestamp::from_datetime)
}

pub(crate) fn opt_ts(row: &PgRow, name: &str) -> Result<Option<Timestamp>, DomainError> {
    Ok(col::<Option<chrono::DateTime<chrono::Utc>>>(row, name)?.map(Timestamp::from_datetime))
}

/// Decodes a text column through the type's `FromStr`.
pub(crate) fn parsed<T>(row: &PgRow, name: &str) -> Result<T, DomainError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = col(row, name)?;
    raw.parse()
        .map_err(|e| DomainError::database(format!("Invalid stored {} '{}': {}", name, raw, e)))
}

pub(crate) fn count(row: &PgRow, name: &str) -> Result<u32, DomainError> {
    let value: i32 = col(row, name)?;
    u32::try_from(value)
        .map_err(|_| DomainError::database(format!("Negative stored {}: {}", name, value)))
}

pub(crate) fn opt_count(row: &PgRow, name: &str) -> Result<Option<u32>, DomainError> {
    col::<Option<i32>>(row, name)?
        .map(|value| {
            u32::try_from(value)
                .map_err(|_| DomainError::database(format!("Negative stored {}: {}", name, value)))
        })
        .transpose()
}

pub(crate) fn opt_id<T: From<uuid::Uuid>>(row: &PgRow, name: &str) -> Result<Option<T>, DomainError> {
    Ok(col::<Option<uuid::Uuid>>(row, name)?.map(T::from))
}

pub(crate) fn id<T: From<uuid::Uuid>>(row: &PgRow, name: &str) -> Result<T, DomainError> {
    Ok(T::from(col::<uuid::Uuid>(row, name)?))
}

pub(crate) fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
