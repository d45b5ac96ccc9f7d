//! Application configuration module
//!
//! Configuration is loaded from environment variables with the
//! `TENANT_LEDGER` prefix; nested values use `__` as the separator. A `.env`
//! file is read first when present.
//!
//! # Example
//!
//! ```no_run
//! use tenant_ledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod identity_mirror;
mod payment;
mod rate_limit;
mod redis;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use identity_mirror::IdentityMirrorSettings;
pub use payment::PaymentConfig;
pub use rate_limit::RateLimitConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub identity_mirror: IdentityMirrorSettings,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `TENANT_LEDGER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TENANT_LEDGER__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or cannot be
    /// parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TENANT_LEDGER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        let environment = &self.server.environment;
        self.server.validate()?;
        self.database.validate(environment)?;
        self.auth.validate(environment)?;
        self.payment.validate(self.is_production())?;
        self.redis.validate()?;
        self.identity_mirror.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Environment variables are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "TENANT_LEDGER__DATABASE__URL",
        "TENANT_LEDGER__AUTH__ISSUER",
        "TENANT_LEDGER__AUTH__AUDIENCE",
        "TENANT_LEDGER__SERVER__PORT",
        "TENANT_LEDGER__SERVER__ENVIRONMENT",
        "TENANT_LEDGER__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "TENANT_LEDGER__RATE_LIMIT__PER_IP_REQUESTS",
    ];

    fn set_minimal_env() {
        env::set_var("TENANT_LEDGER__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("TENANT_LEDGER__AUTH__ISSUER", "https://auth.example.com");
        env::set_var("TENANT_LEDGER__AUTH__AUDIENCE", "tenant-ledger-api");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.auth.audience, "tenant-ledger-api");
        assert!(config.redis.url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_nested_overrides() {
        let config = load_with(&[
            ("TENANT_LEDGER__SERVER__PORT", "3000"),
            ("TENANT_LEDGER__RATE_LIMIT__PER_IP_REQUESTS", "5"),
            ("TENANT_LEDGER__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_test"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.rate_limit.per_ip_requests, 5);
        assert_eq!(config.payment.stripe_secret(), Some("whsec_test"));
    }

    #[test]
    fn test_production_rejects_plaintext_database() {
        let config = load_with(&[
            ("TENANT_LEDGER__SERVER__ENVIRONMENT", "production"),
            ("TENANT_LEDGER__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_test"),
        ])
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::DatabaseMustUseTls));
    }
}
