//! Application layer - access decisions and handlers.
//!
//! [`IdentityResolver`] turns a bearer token into a local user,
//! [`AccessGate`] turns that user plus a tenant into a
//! [`TenantContext`](crate::domain::tenancy::TenantContext), and the
//! handlers run one operation each inside that context.

mod access_gate;
pub mod handlers;
mod identity;
mod notifier;
mod repositories;

pub use access_gate::AccessGate;
pub use identity::IdentityResolver;
pub use notifier::Notifier;
pub use repositories::Repositories;
