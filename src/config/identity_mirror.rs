//! Identity provider mirror configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Management API used to copy tenant roles into the identity provider.
/// When unset, role changes are only stored locally.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityMirrorSettings {
    pub base_url: Option<String>,

    pub service_token: Option<SecretString>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl IdentityMirrorSettings {
    /// Base URL and token, when the mirror is enabled.
    pub fn endpoint(&self) -> Option<(&str, &str)> {
        let url = self.base_url.as_deref().filter(|u| !u.is_empty())?;
        let token = self.service_token.as_ref()?.expose_secret().as_str();
        Some((url, token))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(10))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(url) = self.base_url.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(());
        };
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::InvalidIdentityMirrorUrl);
        }
        if self.service_token.is_none() {
            return Err(ValidationError::MissingRequired("IDENTITY_MIRROR__SERVICE_TOKEN"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let config = IdentityMirrorSettings::default();
        assert!(config.endpoint().is_none());
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_url_requires_token() {
        let config = IdentityMirrorSettings {
            base_url: Some("https://idp.example.com/management/v1".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_endpoint() {
        let config = IdentityMirrorSettings {
            base_url: Some("https://idp.example.com/management/v1".to_string()),
            service_token: Some(SecretString::new("pat-123".to_string())),
            timeout_secs: Some(3),
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.endpoint(),
            Some(("https://idp.example.com/management/v1", "pat-123"))
        );
    }
}
