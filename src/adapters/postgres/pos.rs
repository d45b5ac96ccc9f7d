//! PostgreSQL implementation of PosRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{DomainError, Money, PosTransactionId, TenantId};
use crate::domain::ledger::{LedgerError, PosLineItem, PosTransaction, ReceiptNumber};
use crate::ports::{MutateFn, Mutated, PosRepository};

use super::tx::{
    begin_tenant, col, commit, db_error, id, insert_audit, opt_id, opt_ts, parsed, ts,
};

const POS_COLUMNS: &str = "id, tenant_id, receipt_number, customer_id, staff_id, items, subtotal, \
     discount, total, payment_method, status, notes, void_reason, voided_by, voided_at, created_at";

/// PostgreSQL implementation of PosRepository.
#[derive(Clone)]
pub struct PostgresPosRepository {
    pool: PgPool,
}

impl PostgresPosRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PosRepository for PostgresPosRepository {
    async fn create(&self, transaction: &PosTransaction, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut tx = begin_tenant(&self.pool, transaction.tenant_id).await?;
        sqlx::query(&format!(
            r#"
            INSERT INTO pos_transactions ({POS_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#
        ))
        .bind(transaction.id.as_uuid())
        .bind(transaction.tenant_id.as_uuid())
        .bind(transaction.receipt_number.as_str())
        .bind(transaction.customer_id.map(|u| *u.as_uuid()))
        .bind(transaction.staff_id.as_uuid())
        .bind(Json(&transaction.items))
        .bind(transaction.subtotal.cents())
        .bind(transaction.discount.cents())
        .bind(transaction.total.cents())
        .bind(transaction.payment_method.as_str())
        .bind(transaction.status.as_str())
        .bind(&transaction.notes)
        .bind(&transaction.void_reason)
        .bind(transaction.voided_by.map(|u| *u.as_uuid()))
        .bind(transaction.voided_at.map(|t| t.into_datetime()))
        .bind(transaction.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert pos transaction"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        transaction_id: PosTransactionId,
    ) -> Result<Option<PosTransaction>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {POS_COLUMNS} FROM pos_transactions WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(transaction_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch pos transaction"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(pos_from_row).transpose()?)
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        transaction_id: PosTransactionId,
        apply: &MutateFn<'_, PosTransaction, (), LedgerError>,
    ) -> Result<Mutated<PosTransaction, ()>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {POS_COLUMNS} FROM pos_transactions WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id.as_uuid())
        .bind(transaction_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock pos transaction"))?;
        let Some(row) = row else {
            return Err(LedgerError::not_found("pos_transaction"));
        };

        let stored = pos_from_row(&row)?;
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
            UPDATE pos_transactions SET
                status = $2,
                void_reason = $3,
                voided_by = $4,
                voided_at = $5
            WHERE id = $1
            "#,
        )
        .bind(working.id.as_uuid())
        .bind(working.status.as_str())
        .bind(&working.void_reason)
        .bind(working.voided_by.map(|u| *u.as_uuid()))
        .bind(working.voided_at.map(|t| t.into_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(db_error("update pos transaction"))?;
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;

        Ok(Mutated {
            entity: working,
            child: mutation.child,
            written: true,
        })
    }
}

fn pos_from_row(row: &PgRow) -> Result<PosTransaction, DomainError> {
    let receipt: String = col(row, "receipt_number")?;
    let Json(items): Json<Vec<PosLineItem>> = col(row, "items")?;
    Ok(PosTransaction {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        receipt_number: ReceiptNumber::from_stored(receipt),
        customer_id: opt_id(row, "customer_id")?,
        staff_id: id(row, "staff_id")?,
        items,
        subtotal: Money::from_cents(col(row, "subtotal")?),
        discount: Money::from_cents(col(row, "discount")?),
        total: Money::from_cents(col(row, "total")?),
        payment_method: parsed(row, "payment_method")?,
        status: parsed(row, "status")?,
        notes: col(row, "notes")?,
        void_reason: col(row, "void_reason")?,
        voided_by: opt_id(row, "voided_by")?,
        voided_at: opt_ts(row, "voided_at")?,
        created_at: ts(row, "created_at")?,
    })
}
