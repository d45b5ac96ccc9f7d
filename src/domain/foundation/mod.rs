//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, money, events and error types that
//! form the vocabulary of the tenant ledger.

mod auth;
mod errors;
mod events;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ErrorKind, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventScope, SerializableDomainEvent,
};
pub use ids::{
    AuditLogId, BookingId, GiftCardId, GiftCardTransactionId, MembershipId, OrderId,
    PaymentId, PosTransactionId, ProductId, SessionCreditId, SessionLogId, SessionPackageId,
    SubscriptionId, TenantId, UserId, VoucherId, VoucherRedemptionId,
};
pub use money::{Currency, Money};
pub use state_machine::{StateMachine, TransitionError};
pub use timestamp::Timestamp;
