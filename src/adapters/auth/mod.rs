//! Session validator adapters.
//!
//! - `JwksSessionValidator` - OIDC provider tokens verified against its JWKS
//! - `SharedSecretValidator` - HS256 tokens for development
//! - `MockSessionValidator` - fixed token table for tests

mod claims;
mod jwks;
mod mock;
mod shared_secret;

pub use jwks::{JwksSessionValidator, OidcConfig};
pub use mock::MockSessionValidator;
pub use shared_secret::SharedSecretValidator;
