//! CreateOrderHandler - prices order lines from the catalog and stores a
//! pending order.
//!
//! Customers order for themselves. Staff may place an order on behalf of a
//! customer.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Currency, EventId, ProductId, Timestamp, UserId};
use crate::domain::ledger::{LedgerError, Order, OrderCreated, OrderLineRequest};
use crate::domain::tenancy::TenantContext;
use crate::ports::{OrderRepository, ProductCatalog};

#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub customer_id: Option<UserId>,
    pub items: Vec<OrderLineRequest>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

pub struct CreateOrderHandler {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    notifier: Notifier,
}

impl CreateOrderHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        notifier: Notifier,
    ) -> Self {
        Self {
            orders,
            catalog,
            notifier,
        }
    }

    pub async fn handle(&self, ctx: &TenantContext, cmd: CreateOrderCommand) -> Result<Order, LedgerError> {
        // 1. Resolve who the order is for
        let customer_id = match cmd.customer_id {
            Some(customer) if customer != ctx.user_id && !ctx.is_staff() => {
                return Err(LedgerError::validation(
                    "customerId",
                    "customers can only order for themselves",
                ));
            }
            Some(customer) => customer,
            None => ctx.user_id,
        };
        let currency = match cmd.currency.as_deref() {
            Some(code) => Currency::new(code)?,
            None => Currency::default(),
        };

        // 2. Price the lines from this tenant's catalog
        let product_ids: Vec<ProductId> = cmd.items.iter().map(|line| line.product_id).collect();
        let products = self.catalog.find_many(ctx.tenant_id, &product_ids).await?;

        let now = Timestamp::now();
        let order = Order::place(
            ctx.tenant_id,
            customer_id,
            &cmd.items,
            &products,
            currency,
            cmd.notes,
            ctx.user_id,
            now,
        )?;

        // 3. Persist with its audit row
        let audit = AuditEntry::record(
            ctx.actor(),
            Some(ctx.tenant_id),
            AuditAction::OrderCreated,
            "order",
            order.id,
        )
        .with_metadata(json!({
            "customer_id": order.customer_id,
            "total": order.total,
            "currency": order.currency,
            "items": order.items.len(),
        }))
        .at(now);
        self.orders.create(&order, &audit).await?;

        tracing::info!(tenant_id = %ctx.tenant_id, order_id = %order.id, total = %order.total, "Order created");
        self.notifier
            .notify(&OrderCreated {
                event_id: EventId::new(),
                tenant_id: order.tenant_id,
                order_id: order.id,
                customer_id: order.customer_id,
                total: order.total,
                occurred_at: order.created_at,
            })
            .await;
        Ok(order)
    }
}
