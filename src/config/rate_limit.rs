//! Rate limit configuration

use serde::Deserialize;

use crate::adapters::rate_limiter::{RateLimitPolicy, WindowLimit};

use super::error::ValidationError;

/// Request quotas per scope. Each window is `requests` per `window_secs`.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_per_user")]
    pub per_user_requests: u32,

    #[serde(default = "default_per_ip")]
    pub per_ip_requests: u32,

    #[serde(default = "default_global")]
    pub global_requests: u32,

    #[serde(default = "default_window")]
    pub window_secs: u32,
}

impl RateLimitConfig {
    pub fn policy(&self) -> RateLimitPolicy {
        let window = |requests| WindowLimit {
            requests,
            window_secs: self.window_secs,
        };
        RateLimitPolicy {
            per_user: window(self.per_user_requests),
            per_ip: window(self.per_ip_requests),
            global: window(self.global_requests),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        let any_zero = [self.per_user_requests, self.per_ip_requests, self.global_requests]
            .contains(&0);
        if any_zero || self.window_secs == 0 {
            return Err(ValidationError::InvalidRateLimit);
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            per_user_requests: default_per_user(),
            per_ip_requests: default_per_ip(),
            global_requests: default_global(),
            window_secs: default_window(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_per_user() -> u32 {
    120
}

fn default_per_ip() -> u32 {
    60
}

fn default_global() -> u32 {
    10_000
}

fn default_window() -> u32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_defaults() {
        assert_eq!(RateLimitConfig::default().policy(), RateLimitPolicy::default());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let config = RateLimitConfig {
            window_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRateLimit));
    }

    #[test]
    fn test_disabled_skips_validation() {
        let config = RateLimitConfig {
            enabled: false,
            per_ip_requests: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
