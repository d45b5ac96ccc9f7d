//! Rate limiting port.
//!
//! Fixed-window counters keyed by scope. The in-memory adapter serves a
//! single instance; the Redis adapter shares windows across instances.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, UserId};

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request against `key`'s window.
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Clears the current window for `key`.
    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError>;
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// Every request to the instance.
    Global,
    /// Unauthenticated callers, keyed by client address.
    Ip,
    /// Authenticated callers, keyed by user id.
    User,
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Global => "global",
            RateLimitScope::Ip => "ip",
            RateLimitScope::User => "user",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub scope: RateLimitScope,
    pub identifier: String,
}

impl RateLimitKey {
    pub fn global() -> Self {
        Self {
            scope: RateLimitScope::Global,
            identifier: "all".to_string(),
        }
    }

    pub fn ip(address: impl fmt::Display) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: address.to_string(),
        }
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            scope: RateLimitScope::User,
            identifier: user_id.to_string(),
        }
    }

    /// Storage key, e.g. `ratelimit:user:<uuid>`.
    pub fn storage_key(&self) -> String {
        format!("ratelimit:{}:{}", self.scope, self.identifier)
    }
}

#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed(RateLimitStatus),
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    pub retry_after_secs: u32,
    pub scope: RateLimitScope,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_are_scoped() {
        let user = UserId::new();
        assert_eq!(RateLimitKey::global().storage_key(), "ratelimit:global:all");
        assert_eq!(RateLimitKey::ip("10.0.0.1").storage_key(), "ratelimit:ip:10.0.0.1");
        assert_eq!(
            RateLimitKey::user(user).storage_key(),
            format!("ratelimit:user:{}", user)
        );
    }

    #[test]
    fn rate_limiter_is_object_safe() {
        fn _assert(_: &dyn RateLimiter) {}
    }
}
