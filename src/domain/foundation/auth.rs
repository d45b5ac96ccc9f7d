//! What a validated bearer token says about the caller.
//!
//! An [`AuthenticatedUser`] carries the identity provider's subject and a
//! few profile claims. It is not an internal user yet: the identity
//! resolver upserts a `User` keyed by `subject` on every request.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Stable per-provider subject; the join key to the local user table.
    pub subject: String,
    pub email: String,
    /// From the `name` claim, falling back to `preferred_username`.
    pub display_name: Option<String>,
    pub email_verified: bool,
}

impl AuthenticatedUser {
    pub fn new(
        subject: impl Into<String>,
        email: impl Into<String>,
        display_name: Option<String>,
        email_verified: bool,
    ) -> Self {
        Self {
            subject: subject.into(),
            email: email.into(),
            display_name,
            email_verified,
        }
    }
}

/// Token validation failures. Only `ServiceUnavailable` is worth retrying;
/// the other two answer 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}
