//! Mock session validator for tests and local runs.
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_subject("token-ana", "ana");
//! let user = validator.validate("token-ana").await?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Maps fixed tokens to users. Unknown tokens are `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Registers `token` for a verified user whose email derives from
    /// `subject`.
    pub fn with_subject(self, token: impl Into<String>, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        let user = AuthenticatedUser::new(
            subject.clone(),
            format!("{}@test.example.com", subject),
            Some(subject.clone()),
            true,
        );
        self.with_user(token, user)
    }

    /// Every validation fails with `error` until [`clear_error`](Self::clear_error).
    pub fn with_error(self, error: AuthError) -> Self {
        if let Ok(mut forced) = self.force_error.write() {
            *forced = Some(error);
        }
        self
    }

    pub fn clear_error(&self) {
        if let Ok(mut forced) = self.force_error.write() {
            *forced = None;
        }
    }

    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), user);
        }
    }

    pub fn remove_token(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self.force_error.read().ok().and_then(|e| e.clone()) {
            return Err(error);
        }
        self.tokens
            .read()
            .ok()
            .and_then(|tokens| tokens.get(token).cloned())
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_token_validates() {
        let validator = MockSessionValidator::new().with_subject("t-1", "ana");
        let user = validator.validate("t-1").await.unwrap();
        assert_eq!(user.subject, "ana");
        assert_eq!(user.email, "ana@test.example.com");
    }

    #[tokio::test]
    async fn unknown_and_removed_tokens_are_invalid() {
        let validator = MockSessionValidator::new().with_subject("t-1", "ana");
        assert!(matches!(validator.validate("t-2").await, Err(AuthError::InvalidToken)));
        validator.remove_token("t-1");
        assert!(matches!(validator.validate("t-1").await, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn forced_error_wins_until_cleared() {
        let validator = MockSessionValidator::new()
            .with_subject("t-1", "ana")
            .with_error(AuthError::service_unavailable("down"));
        assert!(matches!(
            validator.validate("t-1").await,
            Err(AuthError::ServiceUnavailable(_))
        ));
        validator.clear_error();
        assert!(validator.validate("t-1").await.is_ok());
    }
}
