//! Webhook error types.
//!
//! Every authentication or payload problem is a 400 so the gateway stops
//! retrying. Only infrastructure failures return 5xx, which the gateway
//! retries later.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::ErrorCode;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature did not verify against the configured secret or key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A required signature header was absent.
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// Webhook timestamp is older than the accepted window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Payload or signature header could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported gateway: {0}")]
    UnsupportedGateway(String),

    /// The gateway is known but not configured on this deployment.
    #[error("Gateway not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the gateway should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_) | WebhookError::NotConfigured(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::MissingHeader(_)
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,
            WebhookError::UnsupportedGateway(_) => StatusCode::NOT_FOUND,
            WebhookError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::MissingHeader(_)
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp => ErrorCode::InvalidSignature,
            WebhookError::ParseError(_) => ErrorCode::ValidationFailed,
            WebhookError::UnsupportedGateway(_) => ErrorCode::NotFound,
            WebhookError::NotConfigured(_) => ErrorCode::ExternalServiceError,
            WebhookError::Database(_) => ErrorCode::DatabaseError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failures_are_bad_requests() {
        for err in [
            WebhookError::InvalidSignature,
            WebhookError::MissingHeader("Stripe-Signature"),
            WebhookError::TimestampOutOfRange,
            WebhookError::ParseError("bad json".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn database_errors_are_retried() {
        let err = WebhookError::Database("connection reset".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_header_names_the_header() {
        assert_eq!(
            WebhookError::MissingHeader("X-Signature").to_string(),
            "Missing header: X-Signature"
        );
    }
}
