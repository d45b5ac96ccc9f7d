//! Orders and their product snapshots.
//!
//! Each order item copies the product's name and price at placement time.
//! Later catalog edits never change a stored order total.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    Currency, Money, OrderId, ProductId, StateMachine, TenantId, Timestamp, UserId,
    ValidationError,
};

use super::LedgerError;

/// Catalog entry as seen by order placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub tenant_id: TenantId,
    pub name: String,
    pub price: Money,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown order status '{}'", other),
            )),
        }
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Confirmed, Cancelled],
            Confirmed => vec![Completed, Cancelled],
            Completed => vec![Refunded],
            Cancelled | Refunded => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub customer_id: UserId,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub currency: Currency,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Places an order against the products fetched for its lines.
    ///
    /// Fails `ProductUnavailable` for any line whose product is missing from
    /// `catalog` or inactive.
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        tenant_id: TenantId,
        customer_id: UserId,
        lines: &[OrderLineRequest],
        catalog: &[Product],
        currency: Currency,
        notes: Option<String>,
        created_by: UserId,
        now: Timestamp,
    ) -> Result<Self, LedgerError> {
        if lines.is_empty() {
            return Err(ValidationError::empty_field("items").into());
        }

        let by_id: HashMap<ProductId, &Product> = catalog
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| (p.id, p))
            .collect();

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(LedgerError::validation("items.quantity", "must be at least 1"));
            }
            let product = by_id
                .get(&line.product_id)
                .filter(|p| p.is_active)
                .ok_or(LedgerError::ProductUnavailable(line.product_id))?;
            let line_total = product
                .price
                .checked_mul(line.quantity)
                .ok_or_else(|| LedgerError::validation("items", "total is too large"))?;
            items.push(OrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                line_total,
            });
        }

        let total = Money::checked_sum(items.iter().map(|i| i.line_total))
            .ok_or_else(|| LedgerError::validation("items", "total is too large"))?;

        Ok(Self {
            id: OrderId::new(),
            tenant_id,
            customer_id,
            items,
            total,
            currency,
            status: OrderStatus::Pending,
            notes,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves the order along its status machine; returns the previous status.
    pub fn update_status(
        &mut self,
        target: OrderStatus,
        now: Timestamp,
    ) -> Result<OrderStatus, LedgerError> {
        let previous = self.status;
        self.status = previous.transition_to(target)?;
        self.updated_at = now;
        Ok(previous)
    }
}
