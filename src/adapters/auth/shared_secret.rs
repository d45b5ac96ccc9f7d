//! HS256 validator for development and internal tooling.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

use super::claims::{map_jwt_error, Claims};

pub struct SharedSecretValidator {
    secret: SecretString,
    issuer: String,
    audience: String,
}

impl SharedSecretValidator {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }
}

#[async_trait]
impl SessionValidator for SharedSecretValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        decode::<Claims>(token, &key, &validation)
            .map_err(map_jwt_error)?
            .claims
            .into_user()
    }
}

impl std::fmt::Debug for SharedSecretValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretValidator")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::claims::Audience;
    use crate::domain::foundation::Timestamp;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "dev-secret";

    fn token(secret: &str, audience: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: "dev-user".to_string(),
            iss: "tenant-ledger-dev".to_string(),
            aud: Audience::Single(audience.to_string()),
            exp: Timestamp::now().as_unix_secs() + exp_offset,
            iat: None,
            email: Some("dev@example.com".to_string()),
            email_verified: Some(true),
            name: Some("Dev".to_string()),
            preferred_username: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator() -> SharedSecretValidator {
        SharedSecretValidator::new(SECRET, "tenant-ledger-dev", "ledger-api")
    }

    #[tokio::test]
    async fn valid_token_maps_to_user() {
        let user = validator()
            .validate(&token(SECRET, "ledger-api", 600))
            .await
            .unwrap();
        assert_eq!(user.subject, "dev-user");
        assert!(user.email_verified);
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let result = validator().validate(&token("other", "ledger-api", 600)).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn wrong_audience_is_invalid() {
        let result = validator().validate(&token(SECRET, "someone-else", 600)).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_reported() {
        let result = validator().validate(&token(SECRET, "ledger-api", -3600)).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }
}
