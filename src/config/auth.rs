//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Bearer token validation settings (OIDC issuer with JWKS).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token issuer URL; JWKS is discovered from it.
    pub issuer: String,

    /// Expected audience for tokens
    pub audience: String,

    /// JWKS cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,

    /// HS256 secret for local development. Replaces JWKS validation when set.
    pub dev_shared_secret: Option<SecretString>,
}

impl AuthConfig {
    /// Get JWKS cache TTL as Duration
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    pub fn shared_secret(&self) -> Option<&str> {
        self.dev_shared_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }

    /// Validate authentication configuration
    ///
    /// In production, requires an HTTPS issuer and forbids the shared
    /// secret.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.issuer.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ISSUER"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__AUDIENCE"));
        }
        if *environment == Environment::Production {
            if !self.issuer.starts_with("https://") {
                return Err(ValidationError::IssuerMustBeHttps);
            }
            if self.shared_secret().is_some() {
                return Err(ValidationError::SharedSecretInProduction);
            }
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            audience: String::new(),
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
            dev_shared_secret: None,
        }
    }
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuthConfig {
        AuthConfig {
            issuer: "https://auth.example.com".to_string(),
            audience: "tenant-ledger-api".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_jwks_cache_ttl_duration() {
        let config = AuthConfig {
            jwks_cache_ttl_secs: 7200,
            ..valid()
        };
        assert_eq!(config.jwks_cache_ttl(), Duration::from_secs(7200));
    }

    #[test]
    fn test_validation_missing_issuer() {
        let config = AuthConfig::default();
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_validation_production_requires_https() {
        let config = AuthConfig {
            issuer: "http://auth.example.com".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::IssuerMustBeHttps)
        );
    }

    #[test]
    fn test_shared_secret_is_development_only() {
        let config = AuthConfig {
            dev_shared_secret: Some(SecretString::new("local-dev-secret".to_string())),
            ..valid()
        };
        assert_eq!(config.shared_secret(), Some("local-dev-secret"));
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::SharedSecretInProduction)
        );
    }

    #[test]
    fn test_empty_shared_secret_is_ignored() {
        let config = AuthConfig {
            dev_shared_secret: Some(SecretString::new(String::new())),
            ..valid()
        };
        assert_eq!(config.shared_secret(), None);
    }
}
