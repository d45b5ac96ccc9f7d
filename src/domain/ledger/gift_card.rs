//! Gift card aggregate.
//!
//! # Invariants
//!
//! - `current_balance >= 0`
//! - `current_balance` equals the signed sum of the card's ledger rows (the
//!   purchase row carries `+initial_balance`)
//! - status is `Depleted` exactly when an otherwise usable card reaches zero
//!
//! Every mutation validates first and only then touches state, so a
//! rejected call leaves the card untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    Currency, GiftCardId, GiftCardTransactionId, Money, TenantId, Timestamp, UserId,
    ValidationError,
};

use super::codes::{normalize_code, random_code};
use super::LedgerError;

/// Redemption code, e.g. `K7QM-3XHP-9TRA-WN2D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftCardCode(String);

impl GiftCardCode {
    pub fn generate() -> Self {
        Self(random_code(4, 4))
    }

    /// Parses a user-supplied code.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let code = normalize_code(raw);
        if code.is_empty() {
            return Err(ValidationError::empty_field("code"));
        }
        if code.len() > 64 || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::invalid_format(
                "code",
                "only letters, digits and hyphens are allowed",
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GiftCardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftCardStatus {
    Active,
    Depleted,
    Cancelled,
    Expired,
}

impl GiftCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftCardStatus::Active => "active",
            GiftCardStatus::Depleted => "depleted",
            GiftCardStatus::Cancelled => "cancelled",
            GiftCardStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for GiftCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GiftCardStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GiftCardStatus::Active),
            "depleted" => Ok(GiftCardStatus::Depleted),
            "cancelled" => Ok(GiftCardStatus::Cancelled),
            "expired" => Ok(GiftCardStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "gift_card_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftCardTransactionKind {
    Purchase,
    Topup,
    Redemption,
}

impl GiftCardTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftCardTransactionKind::Purchase => "purchase",
            GiftCardTransactionKind::Topup => "topup",
            GiftCardTransactionKind::Redemption => "redemption",
        }
    }
}

impl FromStr for GiftCardTransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(GiftCardTransactionKind::Purchase),
            "topup" => Ok(GiftCardTransactionKind::Topup),
            "redemption" => Ok(GiftCardTransactionKind::Redemption),
            other => Err(ValidationError::invalid_format(
                "gift_card_transaction_kind",
                format!("unknown kind '{}'", other),
            )),
        }
    }
}

/// Append-only balance history row. `amount` is signed: purchases and
/// top-ups are positive, redemptions negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardTransaction {
    pub id: GiftCardTransactionId,
    pub tenant_id: TenantId,
    pub gift_card_id: GiftCardId,
    pub kind: GiftCardTransactionKind,
    pub amount: Money,
    pub balance_after: Money,
    pub performed_by: Option<UserId>,
    pub reference: Option<String>,
    pub created_at: Timestamp,
}

/// Issue-time details supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct IssueGiftCard {
    pub initial_balance: Money,
    pub currency: Currency,
    pub expires_at: Option<Timestamp>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
    pub purchased_by: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCard {
    pub id: GiftCardId,
    pub tenant_id: TenantId,
    pub code: GiftCardCode,
    pub initial_balance: Money,
    pub current_balance: Money,
    pub currency: Currency,
    pub expires_at: Option<Timestamp>,
    pub status: GiftCardStatus,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
    pub purchased_by: Option<UserId>,
    pub issued_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GiftCard {
    /// Creates a card together with its purchase ledger row.
    pub fn issue(
        tenant_id: TenantId,
        code: GiftCardCode,
        request: IssueGiftCard,
        issued_by: UserId,
        now: Timestamp,
    ) -> Result<(GiftCard, GiftCardTransaction), LedgerError> {
        if !request.initial_balance.is_positive() {
            return Err(LedgerError::validation(
                "initialBalance",
                "must be greater than zero",
            ));
        }
        if let Some(expires_at) = request.expires_at {
            if !expires_at.is_after(&now) {
                return Err(LedgerError::validation("expiresAt", "must be in the future"));
            }
        }

        let card = GiftCard {
            id: GiftCardId::new(),
            tenant_id,
            code,
            initial_balance: request.initial_balance,
            current_balance: request.initial_balance,
            currency: request.currency,
            expires_at: request.expires_at,
            status: GiftCardStatus::Active,
            recipient_name: request.recipient_name,
            recipient_email: request.recipient_email,
            message: request.message,
            purchased_by: request.purchased_by,
            issued_by,
            created_at: now,
            updated_at: now,
        };
        let purchase = card.ledger_row(
            GiftCardTransactionKind::Purchase,
            request.initial_balance,
            Some(issued_by),
            None,
            now,
        );
        Ok((card, purchase))
    }

    pub fn is_past_expiry(&self, now: Timestamp) -> bool {
        self.expires_at.map_or(false, |at| !now.is_before(&at))
    }

    /// Decrements the balance. Flips to `Depleted` iff the result is zero.
    pub fn redeem(
        &mut self,
        amount: Money,
        performed_by: UserId,
        reference: Option<String>,
        now: Timestamp,
    ) -> Result<GiftCardTransaction, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation("amount", "must be greater than zero"));
        }
        if self.status != GiftCardStatus::Active {
            return Err(LedgerError::invalid_state(self.status.as_str(), "redeem"));
        }
        if self.is_past_expiry(now) {
            return Err(LedgerError::Expired);
        }
        if amount > self.current_balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.current_balance,
            });
        }

        self.current_balance = self.current_balance - amount;
        if self.current_balance.is_zero() {
            self.status = GiftCardStatus::Depleted;
        }
        self.updated_at = now;
        Ok(self.ledger_row(
            GiftCardTransactionKind::Redemption,
            amount.negate(),
            Some(performed_by),
            reference,
            now,
        ))
    }

    /// Adds value to an active or depleted card. A depleted card becomes
    /// active again.
    pub fn top_up(
        &mut self,
        amount: Money,
        performed_by: UserId,
        now: Timestamp,
    ) -> Result<GiftCardTransaction, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation("amount", "must be greater than zero"));
        }
        if !matches!(self.status, GiftCardStatus::Active | GiftCardStatus::Depleted) {
            return Err(LedgerError::invalid_state(self.status.as_str(), "top up"));
        }
        if self.is_past_expiry(now) {
            return Err(LedgerError::Expired);
        }
        let balance = self
            .current_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::validation("amount", "balance would overflow"))?;

        self.current_balance = balance;
        self.status = GiftCardStatus::Active;
        self.updated_at = now;
        Ok(self.ledger_row(
            GiftCardTransactionKind::Topup,
            amount,
            Some(performed_by),
            None,
            now,
        ))
    }

    pub fn cancel(&mut self, now: Timestamp) -> Result<(), LedgerError> {
        if !matches!(self.status, GiftCardStatus::Active | GiftCardStatus::Depleted) {
            return Err(LedgerError::invalid_state(self.status.as_str(), "cancel"));
        }
        self.status = GiftCardStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Restores a cancelled card. A card past its expiry cannot come back.
    pub fn reactivate(&mut self, now: Timestamp) -> Result<(), LedgerError> {
        if self.status != GiftCardStatus::Cancelled {
            return Err(LedgerError::invalid_state(self.status.as_str(), "reactivate"));
        }
        if self.is_past_expiry(now) {
            return Err(LedgerError::Expired);
        }
        self.status = if self.current_balance.is_zero() {
            GiftCardStatus::Depleted
        } else {
            GiftCardStatus::Active
        };
        self.updated_at = now;
        Ok(())
    }

    /// Only cancelled cards may be deleted.
    pub fn ensure_deletable(&self) -> Result<(), LedgerError> {
        if self.status != GiftCardStatus::Cancelled {
            return Err(LedgerError::invalid_state(self.status.as_str(), "delete"));
        }
        Ok(())
    }

    /// Balance implied by a card's ledger rows.
    pub fn ledger_balance(history: &[GiftCardTransaction]) -> Money {
        history.iter().fold(Money::ZERO, |acc, row| acc + row.amount)
    }

    fn ledger_row(
        &self,
        kind: GiftCardTransactionKind,
        amount: Money,
        performed_by: Option<UserId>,
        reference: Option<String>,
        now: Timestamp,
    ) -> GiftCardTransaction {
        GiftCardTransaction {
            id: GiftCardTransactionId::new(),
            tenant_id: self.tenant_id,
            gift_card_id: self.id,
            kind,
            amount,
            balance_after: self.current_balance,
            performed_by,
            reference,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(balance: i64) -> (GiftCard, Vec<GiftCardTransaction>) {
        let (card, purchase) = GiftCard::issue(
            TenantId::new(),
            GiftCardCode::generate(),
            IssueGiftCard {
                initial_balance: Money::from_cents(balance),
                ..Default::default()
            },
            UserId::new(),
            Timestamp::now(),
        )
        .unwrap();
        (card, vec![purchase])
    }

    // ══════════════════════════════════════════════════════════════
    // Issue
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn issue_starts_with_full_balance_and_purchase_row() {
        let (card, history) = issue(5000);
        assert_eq!(card.current_balance, Money::from_cents(5000));
        assert_eq!(card.status, GiftCardStatus::Active);
        assert_eq!(history[0].kind, GiftCardTransactionKind::Purchase);
        assert_eq!(GiftCard::ledger_balance(&history), card.current_balance);
    }

    #[test]
    fn issue_rejects_non_positive_balance() {
        for cents in [0, -100] {
            let result = GiftCard::issue(
                TenantId::new(),
                GiftCardCode::generate(),
                IssueGiftCard {
                    initial_balance: Money::from_cents(cents),
                    ..Default::default()
                },
                UserId::new(),
                Timestamp::now(),
            );
            assert!(matches!(result, Err(LedgerError::Validation { .. })));
        }
    }

    #[test]
    fn issue_rejects_expiry_in_the_past() {
        let now = Timestamp::now();
        let result = GiftCard::issue(
            TenantId::new(),
            GiftCardCode::generate(),
            IssueGiftCard {
                initial_balance: Money::from_cents(100),
                expires_at: Some(now.minus_days(1)),
                ..Default::default()
            },
            UserId::new(),
            now,
        );
        assert!(matches!(result, Err(LedgerError::Validation { .. })));
    }

    // ══════════════════════════════════════════════════════════════
    // Redeem
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn redeem_to_exactly_zero_depletes() {
        let (mut card, mut history) = issue(5000);
        let now = Timestamp::now();

        history.push(card.redeem(Money::from_cents(2000), UserId::new(), None, now).unwrap());
        assert_eq!(card.current_balance, Money::from_cents(3000));
        assert_eq!(card.status, GiftCardStatus::Active);

        history.push(card.redeem(Money::from_cents(3000), UserId::new(), None, now).unwrap());
        assert_eq!(card.current_balance, Money::ZERO);
        assert_eq!(card.status, GiftCardStatus::Depleted);
        assert_eq!(history[2].balance_after, Money::ZERO);
        assert_eq!(history[2].amount, Money::from_cents(-3000));
        assert_eq!(GiftCard::ledger_balance(&history), card.current_balance);

        let err = card
            .redeem(Money::from_cents(100), UserId::new(), None, now)
            .unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn redeem_more_than_balance_leaves_card_unchanged() {
        let (mut card, _) = issue(1000);
        let before = card.clone();

        let err = card
            .redeem(Money::from_cents(1001), UserId::new(), None, Timestamp::now())
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(card, before);
    }

    #[test]
    fn redeem_past_expiry_fails_expired() {
        let (mut card, _) = issue(1000);
        let later = Timestamp::now().add_days(30);
        card.expires_at = Some(Timestamp::now().add_days(1));

        let err = card
            .redeem(Money::from_cents(10), UserId::new(), None, later)
            .unwrap_err();
        assert_eq!(err, LedgerError::Expired);
    }

    #[test]
    fn redeem_cancelled_card_fails_invalid_state() {
        let (mut card, _) = issue(1000);
        card.cancel(Timestamp::now()).unwrap();
        let err = card
            .redeem(Money::from_cents(10), UserId::new(), None, Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn redeem_rejects_non_positive_amount() {
        let (mut card, _) = issue(1000);
        let err = card
            .redeem(Money::ZERO, UserId::new(), None, Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }

    // ══════════════════════════════════════════════════════════════
    // Top-up, cancel, reactivate, delete
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn top_up_revives_depleted_card() {
        let (mut card, mut history) = issue(500);
        let now = Timestamp::now();
        history.push(card.redeem(Money::from_cents(500), UserId::new(), None, now).unwrap());
        history.push(card.top_up(Money::from_cents(200), UserId::new(), now).unwrap());

        assert_eq!(card.status, GiftCardStatus::Active);
        assert_eq!(card.current_balance, Money::from_cents(200));
        assert_eq!(GiftCard::ledger_balance(&history), card.current_balance);
    }

    #[test]
    fn top_up_cancelled_card_fails() {
        let (mut card, _) = issue(500);
        card.cancel(Timestamp::now()).unwrap();
        assert!(card
            .top_up(Money::from_cents(100), UserId::new(), Timestamp::now())
            .is_err());
    }

    #[test]
    fn reactivate_restores_status_from_balance() {
        let (mut card, _) = issue(500);
        let now = Timestamp::now();
        card.cancel(now).unwrap();
        card.reactivate(now).unwrap();
        assert_eq!(card.status, GiftCardStatus::Active);

        card.redeem(Money::from_cents(500), UserId::new(), None, now).unwrap();
        card.cancel(now).unwrap();
        card.reactivate(now).unwrap();
        assert_eq!(card.status, GiftCardStatus::Depleted);
    }

    #[test]
    fn reactivate_past_expiry_fails() {
        let (mut card, _) = issue(500);
        card.expires_at = Some(Timestamp::now().add_days(1));
        card.cancel(Timestamp::now()).unwrap();
        let err = card.reactivate(Timestamp::now().add_days(2)).unwrap_err();
        assert_eq!(err, LedgerError::Expired);
        assert_eq!(card.status, GiftCardStatus::Cancelled);
    }

    #[test]
    fn only_cancelled_cards_are_deletable() {
        let (mut card, _) = issue(500);
        assert!(card.ensure_deletable().is_err());
        card.cancel(Timestamp::now()).unwrap();
        assert!(card.ensure_deletable().is_ok());
    }

    #[test]
    fn code_parse_normalizes_input() {
        assert_eq!(GiftCardCode::parse(" ab12-cd34 ").unwrap().as_str(), "AB12-CD34");
        assert!(GiftCardCode::parse("").is_err());
        assert!(GiftCardCode::parse("abc/def").is_err());
    }
}
