//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind address")]
    InvalidHost,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Database connections must use TLS in production")]
    DatabaseMustUseTls,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool max_connections must be at least 1")]
    EmptyPool,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Auth issuer must use HTTPS in production")]
    IssuerMustBeHttps,

    #[error("Shared-secret tokens are not allowed in production")]
    SharedSecretInProduction,

    #[error("Invalid Stripe webhook secret format")]
    InvalidStripeWebhookSecret,

    #[error("Revenue Monster public key requires a notify URL")]
    MissingRevenueMonsterNotifyUrl,

    #[error("No payment gateway webhook is configured")]
    NoGatewayConfigured,

    #[error("Invalid identity mirror URL")]
    InvalidIdentityMirrorUrl,

    #[error("Rate limit windows must allow at least one request over a non-zero window")]
    InvalidRateLimit,
}
