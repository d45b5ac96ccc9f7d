//! Redis configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Redis backs the shared rate limiter. Without a URL each instance keeps
/// its own in-memory counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: Option<String>,
}

impl RedisConfig {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.url() {
            Some(url) if !url.starts_with("redis://") && !url.starts_with("rediss://") => {
                Err(ValidationError::InvalidRedisUrl)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_is_optional() {
        let config = RedisConfig::default();
        assert!(config.url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let config = RedisConfig {
            url: Some("http://localhost:6379".to_string()),
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRedisUrl));
    }

    #[test]
    fn test_validation_tls_url() {
        let config = RedisConfig {
            url: Some("rediss://cache.internal:6380".to_string()),
        };
        assert!(config.validate().is_ok());
    }
}
