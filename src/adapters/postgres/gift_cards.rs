//! PostgreSQL implementation of GiftCardRepository.
//!
//! Every balance change runs `SELECT .. FOR UPDATE` on the card row, so two
//! concurrent redemptions of the same code serialize and the second sees
//! the balance the first left behind.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{Currency, DomainError, GiftCardId, Money, TenantId};
use crate::domain::ledger::{GiftCard, GiftCardCode, GiftCardTransaction, LedgerError};
use crate::ports::{GiftCardRepository, MutateFn, Mutated};

use super::tx::{
    begin_tenant, col, commit, db_error, id, insert_audit, opt_id, opt_ts, parsed, ts, PgTx,
};

const CARD_COLUMNS: &str = "id, tenant_id, code, initial_balance, current_balance, currency, \
     expires_at, status, recipient_name, recipient_email, message, purchased_by, issued_by, \
     created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, tenant_id, gift_card_id, kind, amount, balance_after, performed_by, reference, created_at";

/// PostgreSQL implementation of GiftCardRepository.
#[derive(Clone)]
pub struct PostgresGiftCardRepository {
    pool: PgPool,
}

impl PostgresGiftCardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock(
        tx: &mut PgTx,
        tenant_id: TenantId,
        code: &GiftCardCode,
    ) -> Result<GiftCard, LedgerError> {
        let row = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards WHERE tenant_id = $1 AND code = $2 FOR UPDATE"
        ))
        .bind(tenant_id.as_uuid())
        .bind(code.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("lock gift card"))?;
        match row {
            Some(row) => Ok(card_from_row(&row)?),
            None => Err(LedgerError::not_found("gift_card")),
        }
    }
}

#[async_trait]
impl GiftCardRepository for PostgresGiftCardRepository {
    async fn issue(
        &self,
        card: &GiftCard,
        purchase: &GiftCardTransaction,
        audit: &AuditEntry,
    ) -> Result<(), LedgerError> {
        let mut tx = begin_tenant(&self.pool, card.tenant_id).await?;
        sqlx::query(&format!(
            r#"
            INSERT INTO gift_cards ({CARD_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#
        ))
        .bind(card.id.as_uuid())
        .bind(card.tenant_id.as_uuid())
        .bind(card.code.as_str())
        .bind(card.initial_balance.cents())
        .bind(card.current_balance.cents())
        .bind(card.currency.as_str())
        .bind(card.expires_at.map(|t| t.into_datetime()))
        .bind(card.status.as_str())
        .bind(&card.recipient_name)
        .bind(&card.recipient_email)
        .bind(&card.message)
        .bind(card.purchased_by.map(|u| *u.as_uuid()))
        .bind(card.issued_by.as_uuid())
        .bind(card.created_at.as_datetime())
        .bind(card.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert gift card"))?;
        insert_transaction(&mut tx, purchase).await?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find_by_code(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
    ) -> Result<Option<GiftCard>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM gift_cards WHERE tenant_id = $1 AND code = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(code.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch gift card"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(card_from_row).transpose()?)
    }

    async fn history(
        &self,
        tenant_id: TenantId,
        card_id: GiftCardId,
    ) -> Result<Vec<GiftCardTransaction>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM gift_card_transactions
            WHERE tenant_id = $1 AND gift_card_id = $2
            ORDER BY created_at, id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(card_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("fetch gift card history"))?;
        commit(tx).await?;
        Ok(rows
            .iter()
            .map(transaction_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
        apply: &MutateFn<'_, GiftCard, Option<GiftCardTransaction>, LedgerError>,
    ) -> Result<Mutated<GiftCard, Option<GiftCardTransaction>>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let stored = Self::lock(&mut tx, tenant_id, code).await?;
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
            UPDATE gift_cards SET
                current_balance = $2,
                status = $3,
                expires_at = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(working.id.as_uuid())
        .bind(working.current_balance.cents())
        .bind(working.status.as_str())
        .bind(working.expires_at.map(|t| t.into_datetime()))
        .bind(working.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("update gift card"))?;
        if let Some(row) = &mutation.child {
            insert_transaction(&mut tx, row).await?;
        }
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;

        Ok(Mutated {
            entity: working,
            child: mutation.child,
            written: true,
        })
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        code: &GiftCardCode,
        audit_for: &(dyn for<'g> Fn(&'g GiftCard) -> Result<AuditEntry, LedgerError> + Send + Sync),
    ) -> Result<GiftCard, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let card = Self::lock(&mut tx, tenant_id, code).await?;
        let audit = audit_for(&card)?;
        sqlx::query("DELETE FROM gift_cards WHERE id = $1")
            .bind(card.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete gift card"))?;
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;
        Ok(card)
    }
}

async fn insert_transaction(tx: &mut PgTx, row: &GiftCardTransaction) -> Result<(), DomainError> {
    sqlx::query(&format!(
        "INSERT INTO gift_card_transactions ({TRANSACTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
    ))
    .bind(row.id.as_uuid())
    .bind(row.tenant_id.as_uuid())
    .bind(row.gift_card_id.as_uuid())
    .bind(row.kind.as_str())
    .bind(row.amount.cents())
    .bind(row.balance_after.cents())
    .bind(row.performed_by.map(|u| *u.as_uuid()))
    .bind(&row.reference)
    .bind(row.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("insert gift card transaction"))?;
    Ok(())
}

fn card_from_row(row: &PgRow) -> Result<GiftCard, DomainError> {
    let code: String = col(row, "code")?;
    let currency: String = col(row, "currency")?;
    Ok(GiftCard {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        code: GiftCardCode::parse(&code)?,
        initial_balance: Money::from_cents(col(row, "initial_balance")?),
        current_balance: Money::from_cents(col(row, "current_balance")?),
        currency: Currency::new(currency.trim())?,
        expires_at: opt_ts(row, "expires_at")?,
        status: parsed(row, "status")?,
        recipient_name: col(row, "recipient_name")?,
        recipient_email: col(row, "recipient_email")?,
        message: col(row, "message")?,
        purchased_by: opt_id(row, "purchased_by")?,
        issued_by: id(row, "issued_by")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<GiftCardTransaction, DomainError> {
    Ok(GiftCardTransaction {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        gift_card_id: id(row, "gift_card_id")?,
        kind: parsed(row, "kind")?,
        amount: Money::from_cents(col(row, "amount")?),
        balance_after: Money::from_cents(col(row, "balance_after")?),
        performed_by: opt_id(row, "performed_by")?,
        reference: col(row, "reference")?,
        created_at: ts(row, "created_at")?,
    })
}
