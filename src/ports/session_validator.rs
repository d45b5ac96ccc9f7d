//! Session validation port.
//!
//! Turns a bearer token into the identity-provider view of the caller.
//! Implementations must check issuer, audience and expiry. Mapping the
//! subject to an internal user is the identity resolver's job, not the
//! validator's.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Returns `InvalidToken`/`TokenExpired` for bad tokens and
    /// `ServiceUnavailable` when the provider cannot be reached.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct TestSessionValidator {
        tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    }

    #[async_trait]
    impl SessionValidator for TestSessionValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = TestSessionValidator {
            tokens: RwLock::new(HashMap::new()),
        };
        assert!(matches!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn session_validator_is_object_safe() {
        fn _assert_trait_object(_: &dyn SessionValidator) {}
        fn _assert_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_send_sync::<std::sync::Arc<dyn SessionValidator>>();
    }
}
