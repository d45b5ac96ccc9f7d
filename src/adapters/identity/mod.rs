//! Identity provider mirror adapters.
//!
//! - `HttpIdentityMirror` - pushes role changes to the provider's management API
//! - `NoopIdentityMirror` - for deployments without a management API

mod http;
mod noop;

pub use http::{HttpIdentityMirror, IdentityMirrorConfig};
pub use noop::NoopIdentityMirror;
