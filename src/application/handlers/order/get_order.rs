//! GetOrderHandler - staff see any order; customers only their own.

use std::sync::Arc;

use crate::domain::foundation::OrderId;
use crate::domain::ledger::{LedgerError, Order};
use crate::domain::tenancy::TenantContext;
use crate::ports::OrderRepository;

pub struct GetOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Another customer's order is reported as not found.
    pub async fn handle(&self, ctx: &TenantContext, id: OrderId) -> Result<Order, LedgerError> {
        self.orders
            .find(ctx.tenant_id, id)
            .await?
            .filter(|order| ctx.is_staff() || order.customer_id == ctx.user_id)
            .ok_or(LedgerError::not_found("order"))
    }
}
