//! UpdateOrderStatusHandler - staff move an order through its lifecycle.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, OrderId, Timestamp};
use crate::domain::ledger::{LedgerError, Order, OrderStatus, OrderStatusChanged};
use crate::domain::tenancy::TenantContext;
use crate::ports::{Mutation, OrderRepository};

#[derive(Debug, Clone)]
pub struct UpdateOrderStatusCommand {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

pub struct UpdateOrderStatusHandler {
    orders: Arc<dyn OrderRepository>,
    notifier: Notifier,
}

impl UpdateOrderStatusHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, notifier: Notifier) -> Self {
        Self { orders, notifier }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: UpdateOrderStatusCommand,
    ) -> Result<Order, LedgerError> {
        let caller = *ctx;
        let target = cmd.status;
        let mutated = self
            .orders
            .modify(ctx.tenant_id, cmd.order_id, &|order| {
                let now = Timestamp::now();
                let previous = order.update_status(target, now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::OrderStatusUpdated,
                    "order",
                    order.id,
                )
                .with_metadata(json!({ "previous_status": previous, "status": order.status }))
                .at(now);
                Ok(Mutation::audited(previous, audit))
            })
            .await?;

        let order = mutated.entity;
        let previous_status = mutated.child;
        tracing::info!(
            tenant_id = %ctx.tenant_id,
            order_id = %order.id,
            %previous_status,
            status = %order.status,
            "Order status updated"
        );
        self.notifier
            .notify(&OrderStatusChanged {
                event_id: EventId::new(),
                tenant_id: order.tenant_id,
                order_id: order.id,
                customer_id: order.customer_id,
                previous_status,
                new_status: order.status,
                occurred_at: order.updated_at,
            })
            .await;
        Ok(order)
    }
}
