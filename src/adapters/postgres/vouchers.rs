//! PostgreSQL implementation of VoucherRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{DomainError, Money, TenantId, VoucherId};
use crate::domain::ledger::{LedgerError, Voucher, VoucherRedemption};
use crate::ports::{MutateFn, Mutated, VoucherRepository};

use super::tx::{
    begin_tenant, col, commit, count, db_error, id, insert_audit, opt_count, opt_ts, parsed,
    to_i32, ts,
};

const VOUCHER_COLUMNS: &str = "id, tenant_id, code, voucher_type, value, max_uses, used_count, \
     expires_at, is_active, description, created_by, created_at, updated_at";
const REDEMPTION_COLUMNS: &str =
    "id, tenant_id, voucher_id, user_id, order_amount, discount_amount, created_at";

/// PostgreSQL implementation of VoucherRepository.
#[derive(Clone)]
pub struct PostgresVoucherRepository {
    pool: PgPool,
}

impl PostgresVoucherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoucherRepository for PostgresVoucherRepository {
    async fn create(&self, voucher: &Voucher, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut tx = begin_tenant(&self.pool, voucher.tenant_id).await?;
        sqlx::query(&format!(
            r#"
            INSERT INTO vouchers ({VOUCHER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#
        ))
        .bind(voucher.id.as_uuid())
        .bind(voucher.tenant_id.as_uuid())
        .bind(&voucher.code)
        .bind(voucher.voucher_type.as_str())
        .bind(voucher.value)
        .bind(voucher.max_uses.map(to_i32))
        .bind(to_i32(voucher.used_count))
        .bind(voucher.expires_at.map(|t| t.into_datetime()))
        .bind(voucher.is_active)
        .bind(&voucher.description)
        .bind(voucher.created_by.as_uuid())
        .bind(voucher.created_at.as_datetime())
        .bind(voucher.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert voucher"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find(&self, tenant_id: TenantId, voucher_id: VoucherId) -> Result<Option<Voucher>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(voucher_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch voucher"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(voucher_from_row).transpose()?)
    }

    async fn redemptions(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
    ) -> Result<Vec<VoucherRedemption>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS} FROM voucher_redemptions
            WHERE tenant_id = $1 AND voucher_id = $2
            ORDER BY created_at, id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(voucher_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("fetch voucher redemptions"))?;
        commit(tx).await?;
        Ok(rows
            .iter()
            .map(redemption_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
        apply: &MutateFn<'_, Voucher, Option<VoucherRedemption>, LedgerError>,
    ) -> Result<Mutated<Voucher, Option<VoucherRedemption>>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id.as_uuid())
        .bind(voucher_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock voucher"))?;
        let Some(row) = row else {
            return Err(LedgerError::not_found("voucher"));
        };

        let stored = voucher_from_row(&row)?;
        let mut working = stored.clone();
        let mutation = apply(&mut working)?;
        let Some(audit) = mutation.audit else {
            commit(tx).await?;
            return Ok(Mutated {
                entity: stored,
                child: mutation.child,
                written: false,
            });
        };

        sqlx::query(
            r#"
            UPDATE vouchers SET
                used_count = $2,
                is_active = $3,
                max_uses = $4,
                expires_at = $5,
                description = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(working.id.as_uuid())
        .bind(to_i32(working.used_count))
        .bind(working.is_active)
        .bind(working.max_uses.map(to_i32))
        .bind(working.expires_at.map(|t| t.into_datetime()))
        .bind(&working.description)
        .bind(working.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("update voucher"))?;

        if let Some(redemption) = &mutation.child {
            sqlx::query(&format!(
                "INSERT INTO voucher_redemptions ({REDEMPTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ))
            .bind(redemption.id.as_uuid())
            .bind(redemption.tenant_id.as_uuid())
            .bind(redemption.voucher_id.as_uuid())
            .bind(redemption.user_id.as_uuid())
            .bind(redemption.order_amount.cents())
            .bind(redemption.discount_amount.cents())
            .bind(redemption.created_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(db_error("insert voucher redemption"))?;
        }
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;

        Ok(Mutated {
            entity: working,
            child: mutation.child,
            written: true,
        })
    }
}

fn voucher_from_row(row: &PgRow) -> Result<Voucher, DomainError> {
    Ok(Voucher {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        code: col(row, "code")?,
        voucher_type: parsed(row, "voucher_type")?,
        value: col(row, "value")?,
        max_uses: opt_count(row, "max_uses")?,
        used_count: count(row, "used_count")?,
        expires_at: opt_ts(row, "expires_at")?,
        is_active: col(row, "is_active")?,
        description: col(row, "description")?,
        created_by: id(row, "created_by")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn redemption_from_row(row: &PgRow) -> Result<VoucherRedemption, DomainError> {
    Ok(VoucherRedemption {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        voucher_id: id(row, "voucher_id")?,
        user_id: id(row, "user_id")?,
        order_amount: Money::from_cents(col(row, "order_amount")?),
        discount_amount: Money::from_cents(col(row, "discount_amount")?),
        created_at: ts(row, "created_at")?,
    })
}
