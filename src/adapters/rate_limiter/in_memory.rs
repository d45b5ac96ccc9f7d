//! Fixed-window counters in a process-local map. Windows are not shared
//! between instances.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::policy::RateLimitPolicy;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: i64,
}

#[derive(Debug)]
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    async fn check_at(&self, key: &RateLimitKey, now: i64) -> RateLimitResult {
        let limit = self.policy.limit_for(key.scope);
        let window_secs = i64::from(limit.window_secs);
        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.storage_key()).or_insert(Window {
            count: 0,
            started_at: now,
        });
        if now >= window.started_at + window_secs {
            *window = Window {
                count: 0,
                started_at: now,
            };
        }
        let resets_in = (window.started_at + window_secs - now).max(1);

        if window.count >= limit.requests {
            return RateLimitResult::Denied(RateLimitDenied {
                limit: limit.requests,
                retry_after_secs: u32::try_from(resets_in).unwrap_or(u32::MAX),
                scope: key.scope,
            });
        }
        window.count += 1;
        RateLimitResult::Allowed(RateLimitStatus {
            limit: limit.requests,
            remaining: limit.requests - window.count,
            reset_at: Timestamp::now().plus_secs(resets_in),
        })
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_at(key, Timestamp::now().as_unix_secs()).await)
    }

    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError> {
        self.windows.lock().await.remove(&key.storage_key());
        Ok(())
    }
}
