//! PostgreSQL implementation of SessionRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{
    DomainError, Money, SessionCreditId, SessionPackageId, TenantId, UserId,
};
use crate::domain::ledger::{LedgerError, SessionCredit, SessionLog, SessionPackage};
use crate::ports::{LogSessionFn, SessionRepository};

use super::tx::{
    begin_tenant, col, commit, count, db_error, id, insert_audit, opt_count, opt_id, opt_ts,
    to_i32, ts,
};

const PACKAGE_COLUMNS: &str =
    "id, tenant_id, name, session_count, price, validity_days, is_active, created_at";
const CREDIT_COLUMNS: &str = "id, tenant_id, user_id, package_id, total_sessions, used_sessions, \
     expires_at, created_at, updated_at";
const LOG_COLUMNS: &str = "id, tenant_id, client_id, coach_id, credit_id, booking_id, \
     session_date, duration_minutes, notes, logged_by, created_at";

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create_package(
        &self,
        package: &SessionPackage,
        audit: &AuditEntry,
    ) -> Result<(), LedgerError> {
        let mut tx = begin_tenant(&self.pool, package.tenant_id).await?;
        sqlx::query(&format!(
            "INSERT INTO session_packages ({PACKAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(package.id.as_uuid())
        .bind(package.tenant_id.as_uuid())
        .bind(&package.name)
        .bind(to_i32(package.session_count))
        .bind(package.price.cents())
        .bind(package.validity_days.map(to_i32))
        .bind(package.is_active)
        .bind(package.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert session package"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find_package(
        &self,
        tenant_id: TenantId,
        package_id: SessionPackageId,
    ) -> Result<Option<SessionPackage>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM session_packages WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(package_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch session package"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(package_from_row).transpose()?)
    }

    async fn grant_credit(&self, credit: &SessionCredit, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut tx = begin_tenant(&self.pool, credit.tenant_id).await?;
        sqlx::query(&format!(
            "INSERT INTO session_credits ({CREDIT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(credit.id.as_uuid())
        .bind(credit.tenant_id.as_uuid())
        .bind(credit.user_id.as_uuid())
        .bind(credit.package_id.map(|p| *p.as_uuid()))
        .bind(to_i32(credit.total_sessions))
        .bind(to_i32(credit.used_sessions))
        .bind(credit.expires_at.map(|t| t.into_datetime()))
        .bind(credit.created_at.as_datetime())
        .bind(credit.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert session credit"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find_credit(
        &self,
        tenant_id: TenantId,
        credit_id: SessionCreditId,
    ) -> Result<Option<SessionCredit>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {CREDIT_COLUMNS} FROM session_credits WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(credit_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch session credit"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(credit_from_row).transpose()?)
    }

    async fn credits_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Vec<SessionCredit>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CREDIT_COLUMNS} FROM session_credits
            WHERE tenant_id = $1 AND user_id = $2
            ORDER BY created_at
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("list session credits"))?;
        commit(tx).await?;
        Ok(rows.iter().map(credit_from_row).collect::<Result<_, _>>()?)
    }

    async fn logs_for_credit(
        &self,
        tenant_id: TenantId,
        credit_id: SessionCreditId,
    ) -> Result<Vec<SessionLog>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {LOG_COLUMNS} FROM session_logs
            WHERE tenant_id = $1 AND credit_id = $2
            ORDER BY created_at, id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(credit_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("list session logs"))?;
        commit(tx).await?;
        Ok(rows.iter().map(log_from_row).collect::<Result<_, _>>()?)
    }

    async fn log_session(
        &self,
        tenant_id: TenantId,
        credit_id: Option<SessionCreditId>,
        build: &LogSessionFn<'_>,
    ) -> Result<(SessionLog, Option<SessionCredit>), LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;

        let mut credit = match credit_id {
            Some(credit_id) => {
                let row = sqlx::query(&format!(
                    "SELECT {CREDIT_COLUMNS} FROM session_credits WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
                ))
                .bind(tenant_id.as_uuid())
                .bind(credit_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("lock session credit"))?;
                match row {
                    Some(row) => Some(credit_from_row(&row)?),
                    None => return Err(LedgerError::not_found("session_credit")),
                }
            }
            None => None,
        };

        let mutation = build(credit.as_mut())?;
        let Some(audit) = mutation.audit else {
            return Err(LedgerError::infrastructure("session log built without an audit entry"));
        };

        if let Some(updated) = &credit {
            sqlx::query("UPDATE session_credits SET used_sessions = $2, updated_at = $3 WHERE id = $1")
                .bind(updated.id.as_uuid())
                .bind(to_i32(updated.used_sessions))
                .bind(updated.updated_at.as_datetime())
                .execute(&mut *tx)
                .await
                .map_err(db_error("update session credit"))?;
        }

        let log = mutation.child;
        sqlx::query(&format!(
            "INSERT INTO session_logs ({LOG_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(log.id.as_uuid())
        .bind(log.tenant_id.as_uuid())
        .bind(log.client_id.as_uuid())
        .bind(log.coach_id.as_uuid())
        .bind(log.credit_id.map(|c| *c.as_uuid()))
        .bind(log.booking_id.map(|b| *b.as_uuid()))
        .bind(log.session_date.as_datetime())
        .bind(log.duration_minutes.map(to_i32))
        .bind(&log.notes)
        .bind(log.logged_by.as_uuid())
        .bind(log.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert session log"))?;
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;

        Ok((log, credit))
    }
}

fn package_from_row(row: &PgRow) -> Result<SessionPackage, DomainError> {
    Ok(SessionPackage {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        name: col(row, "name")?,
        session_count: count(row, "session_count")?,
        price: Money::from_cents(col(row, "price")?),
        validity_days: opt_count(row, "validity_days")?,
        is_active: col(row, "is_active")?,
        created_at: ts(row, "created_at")?,
    })
}

fn credit_from_row(row: &PgRow) -> Result<SessionCredit, DomainError> {
    Ok(SessionCredit {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        user_id: id(row, "user_id")?,
        package_id: opt_id(row, "package_id")?,
        total_sessions: count(row, "total_sessions")?,
        used_sessions: count(row, "used_sessions")?,
        expires_at: opt_ts(row, "expires_at")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn log_from_row(row: &PgRow) -> Result<SessionLog, DomainError> {
    Ok(SessionLog {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        client_id: id(row, "client_id")?,
        coach_id: id(row, "coach_id")?,
        credit_id: opt_id(row, "credit_id")?,
        booking_id: opt_id(row, "booking_id")?,
        session_date: ts(row, "session_date")?,
        duration_minutes: opt_count(row, "duration_minutes")?,
        notes: col(row, "notes")?,
        logged_by: id(row, "logged_by")?,
        created_at: ts(row, "created_at")?,
    })
}
