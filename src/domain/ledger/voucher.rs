//! Voucher aggregate.
//!
//! `used_count` never exceeds `max_uses` when one is set, and always equals
//! the number of redemption rows. `redeem` returns the row it accounts for
//! so the two are written together.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    Money, TenantId, Timestamp, UserId, ValidationError, VoucherId, VoucherRedemptionId,
};

use super::codes::normalize_code;
use super::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherType {
    /// `value` is a whole percentage, 1..=100.
    Percentage,
    /// `value` is an amount in minor units.
    Fixed,
    /// `value` is the number of sessions granted. No monetary discount.
    FreeSession,
}

impl VoucherType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherType::Percentage => "percentage",
            VoucherType::Fixed => "fixed",
            VoucherType::FreeSession => "free_session",
        }
    }

    fn validate_value(&self, value: i64) -> Result<(), ValidationError> {
        let (min, max) = match self {
            VoucherType::Percentage => (1, 100),
            VoucherType::Fixed => (1, i64::MAX),
            VoucherType::FreeSession => (1, 1_000),
        };
        if value < min || value > max {
            return Err(ValidationError::out_of_range("value", min, max, value));
        }
        Ok(())
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(VoucherType::Percentage),
            "fixed" => Ok(VoucherType::Fixed),
            "free_session" => Ok(VoucherType::FreeSession),
            other => Err(ValidationError::invalid_format(
                "type",
                format!("unknown voucher type '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub code: String,
    pub voucher_type: VoucherType,
    pub value: i64,
    pub max_uses: Option<u32>,
    pub expires_at: Option<Timestamp>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: VoucherId,
    pub tenant_id: TenantId,
    pub code: String,
    pub voucher_type: VoucherType,
    pub value: i64,
    pub max_uses: Option<u32>,
    pub used_count: u32,
    pub expires_at: Option<Timestamp>,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherRedemption {
    pub id: VoucherRedemptionId,
    pub tenant_id: TenantId,
    pub voucher_id: VoucherId,
    pub user_id: UserId,
    pub order_amount: Money,
    pub discount_amount: Money,
    pub created_at: Timestamp,
}

impl Voucher {
    pub fn create(
        tenant_id: TenantId,
        request: NewVoucher,
        created_by: UserId,
        now: Timestamp,
    ) -> Result<Self, LedgerError> {
        let code = normalize_code(&request.code);
        if code.is_empty() {
            return Err(ValidationError::empty_field("code").into());
        }
        request.voucher_type.validate_value(request.value)?;
        if request.max_uses == Some(0) {
            return Err(LedgerError::validation("maxUses", "must be at least 1"));
        }
        if let Some(expires_at) = request.expires_at {
            if !expires_at.is_after(&now) {
                return Err(LedgerError::validation("expiresAt", "must be in the future"));
            }
        }

        Ok(Self {
            id: VoucherId::new(),
            tenant_id,
            code,
            voucher_type: request.voucher_type,
            value: request.value,
            max_uses: request.max_uses,
            used_count: 0,
            expires_at: request.expires_at,
            is_active: true,
            description: request.description,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Discount this voucher grants on `order_amount`. Never exceeds the
    /// order total.
    pub fn discount_for(&self, order_amount: Money) -> Money {
        match self.voucher_type {
            VoucherType::Percentage => order_amount.percentage(self.value).min(order_amount),
            VoucherType::Fixed => Money::from_cents(self.value).min(order_amount),
            VoucherType::FreeSession => Money::ZERO,
        }
    }

    pub fn remaining_uses(&self) -> Option<u32> {
        self.max_uses.map(|max| max.saturating_sub(self.used_count))
    }

    /// Consumes one use and returns the redemption row to persist with it.
    pub fn redeem(
        &mut self,
        user_id: UserId,
        order_amount: Money,
        now: Timestamp,
    ) -> Result<VoucherRedemption, LedgerError> {
        if order_amount.is_negative() {
            return Err(LedgerError::validation("orderAmount", "must not be negative"));
        }
        if !self.is_active {
            return Err(LedgerError::Inactive);
        }
        if self.expires_at.map_or(false, |at| !now.is_before(&at)) {
            return Err(LedgerError::Expired);
        }
        if let Some(max) = self.max_uses {
            if self.used_count >= max {
                return Err(LedgerError::MaxUsesReached);
            }
        }

        let discount_amount = self.discount_for(order_amount);
        self.used_count += 1;
        self.updated_at = now;

        Ok(VoucherRedemption {
            id: VoucherRedemptionId::new(),
            tenant_id: self.tenant_id,
            voucher_id: self.id,
            user_id,
            order_amount,
            discount_amount,
            created_at: now,
        })
    }

    pub fn deactivate(&mut self, now: Timestamp) -> Result<(), LedgerError> {
        if !self.is_active {
            return Err(LedgerError::invalid_state("inactive", "deactivate"));
        }
        self.is_active = false;
        self.updated_at = now;
        Ok(())
    }

    pub fn grants_free_session(&self) -> bool {
        self.voucher_type == VoucherType::FreeSession
    }
}
