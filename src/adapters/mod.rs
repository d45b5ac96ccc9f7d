//! Adapters - implementations of the port interfaces.
//!
//! - `auth` - session validators (OIDC JWKS, shared secret, mock)
//! - `events` - event publishers (realtime hub, in-memory capture)
//! - `http` - axum REST and WebSocket surface
//! - `identity` - identity provider role mirror
//! - `memory` - in-memory repositories for tests and local runs
//! - `postgres` - sqlx repositories with row locks and RLS tenant context
//! - `rate_limiter` - fixed-window limiters (in-memory, Redis)

pub mod auth;
pub mod events;
pub mod http;
pub mod identity;
pub mod memory;
pub mod postgres;
pub mod rate_limiter;
