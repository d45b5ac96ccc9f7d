//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Boundary-level category of a failure.
///
/// Every error raised inside the service collapses to exactly one kind,
/// and the HTTP adapter maps kinds to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No session, or the session could not be validated.
    Unauthorized,
    /// Valid session, but tenant membership or role is insufficient.
    Forbidden,
    /// Resource absent or outside the caller's tenant scope.
    NotFound,
    /// Malformed input that never reached an invariant check.
    Validation,
    /// A balance, usage or state-machine rule would be broken.
    InvariantViolation,
    /// Caller exceeded a rate limit.
    RateLimited,
    /// Anything unexpected. Details are logged, never returned.
    Internal,
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,

    // Access errors
    Unauthorized,
    NoTenantAccess,
    InsufficientRole,
    NotPlatformAdmin,

    // Not found errors
    NotFound,
    TenantNotFound,
    UserNotFound,
    GiftCardNotFound,
    VoucherNotFound,
    SessionCreditNotFound,
    PosTransactionNotFound,
    OrderNotFound,
    PaymentNotFound,
    MembershipNotFound,

    // Invariant errors
    InvalidStateTransition,
    Expired,
    InsufficientBalance,
    Inactive,
    MaxUsesReached,
    CreditsExhausted,
    ProductUnavailable,
    Conflict,

    // Webhook errors
    InvalidSignature,

    // Throttling
    RateLimited,

    // Infrastructure errors
    DatabaseError,
    CacheError,
    ExternalServiceError,
    InternalError,
}

impl ErrorCode {
    /// Returns the boundary category for this code.
    pub fn kind(&self) -> ErrorKind {
        use ErrorCode::*;
        match self {
            ValidationFailed | InvalidSignature => ErrorKind::Validation,
            Unauthorized => ErrorKind::Unauthorized,
            NoTenantAccess | InsufficientRole | NotPlatformAdmin => ErrorKind::Forbidden,
            NotFound | TenantNotFound | UserNotFound | GiftCardNotFound | VoucherNotFound
            | SessionCreditNotFound | PosTransactionNotFound | OrderNotFound
            | PaymentNotFound | MembershipNotFound => ErrorKind::NotFound,
            InvalidStateTransition | Expired | InsufficientBalance | Inactive
            | MaxUsesReached | CreditsExhausted | ProductUnavailable | Conflict => {
                ErrorKind::InvariantViolation
            }
            RateLimited => ErrorKind::RateLimited,
            DatabaseError | CacheError | ExternalServiceError | InternalError => {
                ErrorKind::Internal
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NoTenantAccess => "NO_TENANT_ACCESS",
            ErrorCode::InsufficientRole => "INSUFFICIENT_ROLE",
            ErrorCode::NotPlatformAdmin => "NOT_PLATFORM_ADMIN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::TenantNotFound => "TENANT_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::GiftCardNotFound => "GIFT_CARD_NOT_FOUND",
            ErrorCode::VoucherNotFound => "VOUCHER_NOT_FOUND",
            ErrorCode::SessionCreditNotFound => "SESSION_CREDIT_NOT_FOUND",
            ErrorCode::PosTransactionNotFound => "POS_TRANSACTION_NOT_FOUND",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::PaymentNotFound => "PAYMENT_NOT_FOUND",
            ErrorCode::MembershipNotFound => "MEMBERSHIP_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE",
            ErrorCode::Expired => "EXPIRED",
            ErrorCode::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorCode::Inactive => "INACTIVE",
            ErrorCode::MaxUsesReached => "MAX_USES_REACHED",
            ErrorCode::CreditsExhausted => "CREDITS_EXHAUSTED",
            ErrorCode::ProductUnavailable => "PRODUCT_UNAVAILABLE",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
///
/// Ports return this for infrastructure failures; the service-specific
/// error enums wrap it.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns the boundary category.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::validation(err.field().to_string(), err.to_string())
    }
}
