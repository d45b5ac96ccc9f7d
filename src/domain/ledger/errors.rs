//! Ledger error types.
//!
//! Every variant except `Validation`, `NotFound` and `Infrastructure` is an
//! invariant violation: the requested mutation would break a balance, usage
//! or state-machine rule, and the entity is left exactly as it was.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | InvalidState, Expired, InsufficientBalance, Inactive, MaxUsesReached, CreditsExhausted, ProductUnavailable, Conflict | 422 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{
    DomainError, ErrorCode, ErrorKind, Money, ProductId, TransitionError, ValidationError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    Validation { field: String, message: String },

    /// Absent, or outside the caller's tenant. The two are indistinguishable.
    NotFound { resource: &'static str },

    InvalidState { current: String, attempted: String },

    Expired,

    InsufficientBalance { requested: Money, available: Money },

    Inactive,

    MaxUsesReached,

    CreditsExhausted,

    ProductUnavailable(ProductId),

    /// A uniqueness rule (code, receipt number) was hit.
    Conflict(String),

    Infrastructure(String),
}

impl LedgerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        LedgerError::NotFound { resource }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        LedgerError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        LedgerError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Validation { .. } => ErrorCode::ValidationFailed,
            LedgerError::NotFound { resource } => match *resource {
                "gift_card" => ErrorCode::GiftCardNotFound,
                "voucher" => ErrorCode::VoucherNotFound,
                "session_credit" => ErrorCode::SessionCreditNotFound,
                "pos_transaction" => ErrorCode::PosTransactionNotFound,
                "order" => ErrorCode::OrderNotFound,
                "payment" => ErrorCode::PaymentNotFound,
                _ => ErrorCode::NotFound,
            },
            LedgerError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            LedgerError::Expired => ErrorCode::Expired,
            LedgerError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            LedgerError::Inactive => ErrorCode::Inactive,
            LedgerError::MaxUsesReached => ErrorCode::MaxUsesReached,
            LedgerError::CreditsExhausted => ErrorCode::CreditsExhausted,
            LedgerError::ProductUnavailable(_) => ErrorCode::ProductUnavailable,
            LedgerError::Conflict(_) => ErrorCode::Conflict,
            LedgerError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    pub fn is_invariant_violation(&self) -> bool {
        self.kind() == ErrorKind::InvariantViolation
    }

    /// Returns a caller-safe error message.
    pub fn message(&self) -> String {
        match self {
            LedgerError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            LedgerError::NotFound { resource } => {
                format!("{} not found", resource.replace('_', " "))
            }
            LedgerError::InvalidState { current, attempted } => {
                format!("Cannot {} while {}", attempted, current)
            }
            LedgerError::Expired => "This item has expired".to_string(),
            LedgerError::InsufficientBalance {
                requested,
                available,
            } => format!(
                "Insufficient balance: requested {}, available {}",
                requested, available
            ),
            LedgerError::Inactive => "This item is not active".to_string(),
            LedgerError::MaxUsesReached => "Maximum number of uses reached".to_string(),
            LedgerError::CreditsExhausted => "No session credits remaining".to_string(),
            LedgerError::ProductUnavailable(id) => format!("Product {} is unavailable", id),
            LedgerError::Conflict(what) => format!("Conflict: {}", what),
            LedgerError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for LedgerError {}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<TransitionError> for LedgerError {
    fn from(err: TransitionError) -> Self {
        LedgerError::InvalidState {
            current: err.from,
            attempted: format!("move to {}", err.to),
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => LedgerError::Validation {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::Conflict => LedgerError::Conflict(err.message),
            _ => LedgerError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_and_usage_errors_are_invariant_violations() {
        assert!(LedgerError::InsufficientBalance {
            requested: Money::from_cents(100),
            available: Money::ZERO
        }
        .is_invariant_violation());
        assert!(LedgerError::MaxUsesReached.is_invariant_violation());
        assert!(LedgerError::CreditsExhausted.is_invariant_violation());
        assert!(LedgerError::invalid_state("voided", "void").is_invariant_violation());
    }

    #[test]
    fn not_found_uses_resource_specific_code() {
        assert_eq!(
            LedgerError::not_found("gift_card").code(),
            ErrorCode::GiftCardNotFound
        );
        assert_eq!(LedgerError::not_found("gift_card").message(), "gift card not found");
        assert_eq!(LedgerError::not_found("product").code(), ErrorCode::NotFound);
    }

    #[test]
    fn transition_errors_become_invalid_state() {
        let err: LedgerError = TransitionError {
            from: "completed".into(),
            to: "pending".into(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn infrastructure_is_internal() {
        let err: LedgerError = DomainError::database("deadlock detected").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
