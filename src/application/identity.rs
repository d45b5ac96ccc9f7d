//! Identity resolver.
//!
//! Maps a bearer token to the internal [`User`]. The identity provider's
//! subject is looked up (and the row created on first sight) so every
//! later check works with the stable internal user id.

use std::sync::Arc;

use crate::domain::foundation::{AuthError, AuthenticatedUser, DomainError};
use crate::domain::tenancy::{AccessError, User};
use crate::ports::{SessionValidator, UserRepository};

#[derive(Clone)]
pub struct IdentityResolver {
    validator: Arc<dyn SessionValidator>,
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(validator: Arc<dyn SessionValidator>, users: Arc<dyn UserRepository>) -> Self {
        Self { validator, users }
    }

    /// Validates the token and returns the internal user.
    pub async fn resolve_token(&self, token: &str) -> Result<User, AccessError> {
        let identity = self.validator.validate(token).await.map_err(|e| match e {
            AuthError::InvalidToken | AuthError::TokenExpired => {
                tracing::debug!(error = %e, "Bearer token rejected");
                AccessError::Unauthenticated
            }
            AuthError::ServiceUnavailable(msg) => AccessError::infrastructure(msg),
        })?;
        Ok(self.resolve(&identity).await?)
    }

    pub async fn resolve(&self, identity: &AuthenticatedUser) -> Result<User, DomainError> {
        self.users.upsert_by_subject(identity).await
    }
}
