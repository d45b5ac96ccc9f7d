//! HTTP middleware for axum.
//!
//! - `auth` - resolves the bearer token to the internal user
//! - `rate_limit` - fixed-window throttling per user or client address

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, CurrentUser, RequireUser};
pub use rate_limit::{rate_limit_middleware, RateLimiterState};
