//! Per-scope window limits.

use serde::{Deserialize, Serialize};

use crate::ports::RateLimitScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimit {
    pub requests: u32,
    pub window_secs: u32,
}

impl WindowLimit {
    pub const fn per_minute(requests: u32) -> Self {
        Self {
            requests,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub per_user: WindowLimit,
    pub per_ip: WindowLimit,
    pub global: WindowLimit,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            per_user: WindowLimit::per_minute(120),
            per_ip: WindowLimit::per_minute(60),
            global: WindowLimit::per_minute(10_000),
        }
    }
}

impl RateLimitPolicy {
    pub fn limit_for(&self, scope: RateLimitScope) -> WindowLimit {
        match scope {
            RateLimitScope::User => self.per_user,
            RateLimitScope::Ip => self.per_ip,
            RateLimitScope::Global => self.global,
        }
    }
}
