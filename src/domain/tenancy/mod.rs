//! Tenancy module - tenants, users, memberships and roles.
//!
//! The membership table is the sole authorization source. A request is
//! allowed to touch tenant data only after it has been turned into a
//! `TenantContext` by the access gate.

mod context;
mod errors;
mod events;
mod membership;
mod role;
mod tenant;

pub use context::{PlatformContext, TenantContext};
pub use errors::AccessError;
pub use events::MembershipRoleChanged;
pub use membership::{MembershipStatus, TenantMembership};
pub use role::{require_role, Role};
pub use tenant::{Tenant, TenantSlug, TenantStatus, User};
