//! PostgreSQL implementations of OrderRepository and ProductCatalog.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{Currency, DomainError, Money, OrderId, ProductId, TenantId};
use crate::domain::ledger::{LedgerError, Order, OrderItem, OrderStatus, Product};
use crate::ports::{MutateFn, Mutated, OrderRepository, ProductCatalog};

use super::tx::{begin_tenant, col, commit, db_error, id, insert_audit, parsed, ts};

const ORDER_COLUMNS: &str =
    "id, tenant_id, customer_id, items, total, currency, status, notes, created_by, created_at, updated_at";

/// PostgreSQL implementation of OrderRepository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: &Order, audit: &AuditEntry) -> Result<(), LedgerError> {
        let mut tx = begin_tenant(&self.pool, order.tenant_id).await?;
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(order.id.as_uuid())
        .bind(order.tenant_id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(Json(&order.items))
        .bind(order.total.cents())
        .bind(order.currency.as_str())
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.created_by.as_uuid())
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert order"))?;
        insert_audit(&mut tx, audit).await?;
        commit(tx).await?;
        Ok(())
    }

    async fn find(&self, tenant_id: TenantId, order_id: OrderId) -> Result<Option<Order>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("fetch order"))?;
        commit(tx).await?;
        Ok(row.as_ref().map(order_from_row).transpose()?)
    }

    async fn modify(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        apply: &MutateFn<'_, Order, OrderStatus, LedgerError>,
    ) -> Result<Mutated<Order, OrderStatus>, LedgerError> {
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock order"))?;
        let Some(row) = row else {
            return Err(LedgerError::not_found("order"));
        };

        let stored = order_from_row(&row)?;
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

        sqlx::query("UPDATE orders SET status = $2, notes = $3, updated_at = $4 WHERE id = $1")
            .bind(working.id.as_uuid())
            .bind(working.status.as_str())
            .bind(&working.notes)
            .bind(working.updated_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(db_error("update order"))?;
        insert_audit(&mut tx, &audit).await?;
        commit(tx).await?;

        Ok(Mutated {
            entity: working,
            child: mutation.child,
            written: true,
        })
    }
}

/// PostgreSQL implementation of ProductCatalog.
#[derive(Clone)]
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn find_many(
        &self,
        tenant_id: TenantId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, LedgerError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|p| *p.as_uuid()).collect();
        let mut tx = begin_tenant(&self.pool, tenant_id).await?;
        let rows = sqlx::query(
            "SELECT id, tenant_id, name, price, is_active FROM products WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id.as_uuid())
        .bind(&uuids)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("fetch products"))?;
        commit(tx).await?;
        Ok(rows.iter().map(product_from_row).collect::<Result<_, _>>()?)
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, DomainError> {
    let Json(items): Json<Vec<OrderItem>> = col(row, "items")?;
    let currency: String = col(row, "currency")?;
    Ok(Order {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        customer_id: id(row, "customer_id")?,
        items,
        total: Money::from_cents(col(row, "total")?),
        currency: Currency::new(currency.trim())?,
        status: parsed(row, "status")?,
        notes: col(row, "notes")?,
        created_by: id(row, "created_by")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, DomainError> {
    Ok(Product {
        id: id(row, "id")?,
        tenant_id: id(row, "tenant_id")?,
        name: col(row, "name")?,
        price: Money::from_cents(col(row, "price")?),
        is_active: col(row, "is_active")?,
    })
}
