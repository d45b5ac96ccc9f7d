//! PostgreSQL implementations of PaymentRepository and
//! SubscriptionRepository.
//!
//! Webhook callbacks carry no tenant, so `reconcile_by_reference` runs in a
//! system transaction. The row lock still serializes replays of the same
//! callback.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{Currency, DomainError, Money, PaymentId, TenantId};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::{
    Gateway, Payment, PaymentStatus, Reconciliation, Subscription, SubscriptionStatus,
};
use crate::ports::{MutateFn, Mutated, PaymentRepository, SubscriptionRepository};

use super::tx::{
    begin_system, begin_tenant, col, commit, db_error, id, insert_audit, opt_id, opt_ts, parsed,
    ts, PgTx,
};

const PAYMENT_COLUMNS: &str = "id, tenant_id, customer_id, order_id, amount, currency, gateway, \
     status, gateway_reference, created_at, updated_at";
const SUBSCRIPTION_COLUMNS: &str =
    "id, tenant_id, gateway_subscription_id, plan, status, current_period_end, created_at, updated_at";

/// PostgreSQL implementation of PaymentRepository.
#[derive(Clone)]
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn create(&self, payment: &Payment, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut tx = begin_tenant(&self.pool, payment.tenant_id).await?;
        sqlx::query(&format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(payment.id.as_uuid())
        .bind(payment.tenant_id.as_uuid())
        .bind(payment.customer_id.map(|u| *u.as_uuid()))
        .bind(payment.order_id.map(|o| *o.as_uuid()))
        .bind(payment.amount.cents())
        .bind(payment.currency.as_str())
        .bind(payment.gateway.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.gateway_reference)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert payment"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find(&self, tenant_id: TenantId, payment_id: PaymentId) -> Result<Option<Payment>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(payment_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch payment"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(payment_from_row).transpose()?)
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
        apply: &MutateFn<'_, Payment, PaymentStatus, LedgerError>,
    ) -> Result<Mutated<Payment, PaymentStatus>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id.as_uuid())
        .bind(payment_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock payment"))?;
        let Some(row) = row else {
            return Err(LedgerError::not_found("payment"));
        };
        apply_payment(tx, payment_from_row(&row)?, apply).await
    }

    async fn reconcile_by_reference(
        &self,
        gateway: Gateway,
        reference: &str,
        apply: &MutateFn<'_, Payment, Reconciliation<PaymentStatus>, LedgerError>,
    ) -> Result<Option<Mutated<Payment, Reconciliation<PaymentStatus>>>, LedgerError> {
        let mut tx = begin_system(&self.pool).await?;
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway = $1 AND gateway_reference = $2 FOR UPDATE"
        ))
        .bind(gateway.as_str())
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock payment by reference"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        apply_payment(tx, payment_from_row(&row)?, apply).await.map(Some)
    }
}

async fn apply_payment<C: Send>(
    mut tx: PgTx,
    stored: Payment,
    apply: &MutateFn<'_, Payment, C, LedgerError>,
) -> Result<Mutated<Payment, C>, LedgerError> {
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

    sqlx::query("UPDATE payments SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(working.id.as_uuid())
        .bind(working.status.as_str())
        .bind(working.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("update payment"))?;
    insert_audit(&mut tx, &audit).await?;
    commit(tx).await?;

    Ok(Mutated {
        entity: working,
        child: mutation.child,
        written: true,
    })
}

/// PostgreSQL implementation of SubscriptionRepository.
#[derive(Clone)]
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create(&self, subscription: &Subscription, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut tx = begin_system(&self.pool).await?;
        sqlx::query(&format!(
            "INSERT INTO subscriptions ({SUBSCRIPTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(subscription.id.as_uuid())
        .bind(subscription.tenant_id.as_uuid())
        .bind(&subscription.gateway_subscription_id)
        .bind(&subscription.plan)
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_end.map(|t| t.into_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert subscription"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find_for_tenant(&self, tenant_id: TenantId) -> Result<Option<Subscription>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch subscription"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(subscription_from_row).transpose()?)
    }

    async fn reconcile_by_reference(
        &self,
        reference: &str,
        apply: &MutateFn<'_, Subscription, Reconciliation<SubscriptionStatus>, LedgerError>,
    ) -> Result<Option<Mutated<Subscription, Reconciliation<SubscriptionStatus>>>, LedgerError>
    {
        let mut tx = begin_system(&self.pool).await?;
        let row = sqlx::query(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE gateway_subscription_id = $1 FOR UPDATE"
        ))
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock subscription"))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let stored = subscription_from_row(&row)?;
        let mut working = stored.clone();
        let mutation = apply(&mut working)?;
        let Some(audit) = mutation.audit else {
            commit(tx).await?;
            return Ok(Some(Mutated {
                entity: stored,
                child: mutation.child,
                written: false,
            }));
        };

        sqlx::query(
            "UPDATE subscriptions SET status = $2, current_period_end = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(working.id.as_uuid())
        .bind(working.status.as_str())
        .bind(working.current_period_end.map(|t| t.into_datetime()))
        .bind(working.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("update subscription"))?;
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;

        Ok(Some(Mutated {
            entity: working,
            child: mutation.child,
            written: true,
        }))
    }
}

fn payment_from_row(row: &PgRow) -> Result<Payment, DomainError> {
    let currency: String = col(row, "currency")?;
    Ok(Payment {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        customer_id: opt_id(row, "customer_id")?,
        order_id: opt_id(row, "order_id")?,
        amount: Money::from_cents(col(row, "amount")?),
        currency: Currency::new(currency.trim())?,
        gateway: parsed(row, "gateway")?,
        status: parsed(row, "status")?,
        gateway_reference: col(row, "gateway_reference")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn subscription_from_row(row: &PgRow) -> Result<Subscription, DomainError> {
    Ok(Subscription {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        gateway_subscription_id: col(row, "gateway_subscription_id")?,
        plan: col(row, "plan")?,
        status: parsed(row, "status")?,
        current_period_end: opt_ts(row, "current_period_end")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}
