//! Token claims shared by the JWT validators.

use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub sub: String,
    pub iss: String,
    #[serde(default)]
    pub aud: Audience,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl Claims {
    pub fn into_user(self) -> Result<AuthenticatedUser, AuthError> {
        if self.sub.trim().is_empty() {
            tracing::debug!("Token has an empty subject");
            return Err(AuthError::InvalidToken);
        }
        let email = self.email.ok_or_else(|| {
            tracing::debug!("Token missing email claim");
            AuthError::InvalidToken
        })?;
        Ok(AuthenticatedUser::new(
            self.sub,
            email,
            self.name.or(self.preferred_username),
            self.email_verified.unwrap_or(false),
        ))
    }
}

/// `aud` is either one string or an array in JWTs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Audience {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::None => false,
            Audience::Single(s) => s == expected,
            Audience::Multiple(v) => v.iter().any(|s| s == expected),
        }
    }
}

pub(crate) fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => {
            tracing::debug!("Token expired");
            AuthError::TokenExpired
        }
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
            tracing::debug!(error = %err, "Token issued for someone else");
            AuthError::InvalidToken
        }
        _ => {
            tracing::debug!(error = %err, "Token validation failed");
            AuthError::InvalidToken
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(email: Option<&str>) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            iss: "https://auth.example.com".to_string(),
            aud: Audience::Single("ledger-api".to_string()),
            exp: 0,
            iat: None,
            email: email.map(str::to_string),
            email_verified: Some(true),
            name: None,
            preferred_username: Some("ana".to_string()),
        }
    }

    #[test]
    fn audience_variants() {
        assert!(Audience::Single("a".into()).contains("a"));
        assert!(Audience::Multiple(vec!["a".into(), "b".into()]).contains("b"));
        assert!(!Audience::None.contains("a"));
    }

    #[test]
    fn username_stands_in_for_missing_name() {
        let user = claims(Some("ana@example.com")).into_user().unwrap();
        assert_eq!(user.subject, "user-1");
        assert_eq!(user.display_name.as_deref(), Some("ana"));
    }

    #[test]
    fn email_is_required() {
        assert!(matches!(claims(None).into_user(), Err(AuthError::InvalidToken)));
    }
}
