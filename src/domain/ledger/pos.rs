//! Point-of-sale transactions.
//!
//! Lines are priced by the caller at the till and stored as-is. A
//! transaction is born `completed` and may be voided exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    Money, PosTransactionId, ProductId, StateMachine, TenantId, Timestamp, UserId,
    ValidationError,
};

use super::codes::random_code;
use super::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosLineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl PosLineItem {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Ewallet,
    GiftCard,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Ewallet => "ewallet",
            PaymentMethod::GiftCard => "gift_card",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "ewallet" => Ok(PaymentMethod::Ewallet),
            "gift_card" => Ok(PaymentMethod::GiftCard),
            "other" => Ok(PaymentMethod::Other),
            other => Err(ValidationError::invalid_format(
                "paymentMethod",
                format!("unknown payment method '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosStatus {
    Completed,
    Voided,
}

impl PosStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosStatus::Completed => "completed",
            PosStatus::Voided => "voided",
        }
    }
}

impl fmt::Display for PosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(PosStatus::Completed),
            "voided" => Ok(PosStatus::Voided),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown POS status '{}'", other),
            )),
        }
    }
}

impl StateMachine for PosStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (PosStatus::Completed, PosStatus::Voided))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            PosStatus::Completed => vec![PosStatus::Voided],
            PosStatus::Voided => vec![],
        }
    }
}

/// `RCP-YYYYMMDD-XXXXXX`, unique per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptNumber(String);

impl ReceiptNumber {
    pub fn generate(now: Timestamp) -> Self {
        Self(format!("RCP-{}-{}", now.compact_date(), random_code(1, 6)))
    }

    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct NewPosTransaction {
    pub customer_id: Option<UserId>,
    pub items: Vec<PosLineItem>,
    pub discount: Money,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosTransaction {
    pub id: PosTransactionId,
    pub tenant_id: TenantId,
    pub receipt_number: ReceiptNumber,
    pub customer_id: Option<UserId>,
    pub staff_id: UserId,
    pub items: Vec<PosLineItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub status: PosStatus,
    pub notes: Option<String>,
    pub void_reason: Option<String>,
    pub voided_by: Option<UserId>,
    pub voided_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl PosTransaction {
    /// Prices the sale and records it as completed.
    pub fn complete(
        tenant_id: TenantId,
        request: NewPosTransaction,
        staff_id: UserId,
        now: Timestamp,
    ) -> Result<Self, LedgerError> {
        if request.items.is_empty() {
            return Err(ValidationError::empty_field("items").into());
        }
        for item in &request.items {
            if item.name.trim().is_empty() {
                return Err(ValidationError::empty_field("items.name").into());
            }
            if item.quantity == 0 {
                return Err(LedgerError::validation("items.quantity", "must be at least 1"));
            }
            if item.unit_price.is_negative() {
                return Err(LedgerError::validation("items.unitPrice", "must not be negative"));
            }
        }

        let line_totals = request
            .items
            .iter()
            .map(|item| item.line_total())
            .collect::<Option<Vec<_>>>()
            .and_then(Money::checked_sum)
            .ok_or_else(|| LedgerError::validation("items", "total is too large"))?;

        if request.discount.is_negative() {
            return Err(LedgerError::validation("discount", "must not be negative"));
        }
        if request.discount > line_totals {
            return Err(LedgerError::validation("discount", "cannot exceed the subtotal"));
        }

        Ok(Self {
            id: PosTransactionId::new(),
            tenant_id,
            receipt_number: ReceiptNumber::generate(now),
            customer_id: request.customer_id,
            staff_id,
            items: request.items,
            subtotal: line_totals,
            discount: request.discount,
            total: line_totals - request.discount,
            payment_method: request.payment_method,
            status: PosStatus::Completed,
            notes: request.notes,
            void_reason: None,
            voided_by: None,
            voided_at: None,
            created_at: now,
        })
    }

    pub fn void(
        &mut self,
        reason: Option<String>,
        voided_by: UserId,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.status = self.status.transition_to(PosStatus::Voided)?;
        self.void_reason = reason;
        self.voided_by = Some(voided_by);
        self.voided_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: i64, qty: u32) -> PosLineItem {
        PosLineItem {
            product_id: None,
            name: name.to_string(),
            unit_price: Money::from_cents(price),
            quantity: qty,
        }
    }

    fn sale(discount: i64) -> Result<PosTransaction, LedgerError> {
        PosTransaction::complete(
            TenantId::new(),
            NewPosTransaction {
                customer_id: None,
                items: vec![line("Towel", 1_500, 2), line("Water", 300, 1)],
                discount: Money::from_cents(discount),
                payment_method: PaymentMethod::Cash,
                notes: None,
            },
            UserId::new(),
            Timestamp::now(),
        )
    }

    #[test]
    fn total_is_subtotal_minus_discount() {
        let tx = sale(300).unwrap();
        assert_eq!(tx.subtotal, Money::from_cents(3_300));
        assert_eq!(tx.total, Money::from_cents(3_000));
        assert_eq!(tx.status, PosStatus::Completed);
    }

    #[test]
    fn discount_above_subtotal_is_rejected() {
        assert!(matches!(sale(5_000), Err(LedgerError::Validation { .. })));
    }

    #[test]
    fn void_happens_exactly_once() {
        let mut tx = sale(0).unwrap();
        tx.void(Some("wrong item".into()), UserId::new(), Timestamp::now()).unwrap();
        assert_eq!(tx.status, PosStatus::Voided);

        let before = tx.clone();
        let err = tx.void(None, UserId::new(), Timestamp::now()).unwrap_err();
        assert!(err.is_invariant_violation());
        assert_eq!(tx, before);
    }

    #[test]
    fn empty_sale_is_rejected() {
        let result = PosTransaction::complete(
            TenantId::new(),
            NewPosTransaction {
                customer_id: None,
                items: vec![],
                discount: Money::ZERO,
                payment_method: PaymentMethod::Card,
                notes: None,
            },
            UserId::new(),
            Timestamp::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn receipt_number_has_date_prefix() {
        let now = Timestamp::now();
        let receipt = ReceiptNumber::generate(now);
        let prefix = format!("RCP-{}-", now.compact_date());
        assert!(receipt.as_str().starts_with(&prefix));
        assert_eq!(receipt.as_str().len(), prefix.len() + 6);
    }
}
