//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `UserRepository`, `TenantRepository`, `MembershipRepository` - identity and tenancy
//! - `GiftCardRepository`, `VoucherRepository`, `SessionRepository`,
//!   `PosRepository`, `OrderRepository` - ledgers, all mutated through the
//!   locked [`Mutation`] contract
//! - `PaymentRepository`, `SubscriptionRepository` - gateway-reconciled records
//! - `AuditLogReader` - read side of the audit trail
//!
//! ## Outbound Ports
//!
//! - `EventPublisher` - best-effort realtime notification
//! - `IdentityProviderMirror` - role sync to the identity provider
//! - `SessionValidator` - bearer token validation
//! - `RateLimiter` - request quotas

mod audit_log_reader;
mod event_publisher;
mod gift_card_repository;
mod identity_mirror;
mod mutation;
mod order_repository;
mod payment_repository;
mod pos_repository;
mod rate_limiter;
mod session_repository;
mod session_validator;
mod tenant_repository;
mod user_repository;
mod voucher_repository;

pub use audit_log_reader::AuditLogReader;
pub use event_publisher::EventPublisher;
pub use gift_card_repository::GiftCardRepository;
pub use identity_mirror::IdentityProviderMirror;
pub use mutation::{MutateFn, Mutated, Mutation};
pub use order_repository::{OrderRepository, ProductCatalog};
pub use payment_repository::{PaymentRepository, SubscriptionRepository};
pub use pos_repository::PosRepository;
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
pub use session_repository::{LogSessionFn, SessionRepository};
pub use session_validator::SessionValidator;
pub use tenant_repository::{MembershipRepository, TenantRepository};
pub use user_repository::UserRepository;
pub use voucher_repository::VoucherRepository;
