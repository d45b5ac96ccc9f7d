//! Redis fixed-window limiter shared by every instance.
//!
//! `INCR` the window key, `EXPIRE` it on the first hit, deny once the count
//! passes the limit. Requests can briefly exceed the limit at a window
//! boundary.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::policy::RateLimitPolicy;

#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    policy: RateLimitPolicy,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, policy: RateLimitPolicy) -> Self {
        Self { conn, policy }
    }

    pub async fn connect(url: &str, policy: RateLimitPolicy) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn, policy))
    }
}

fn unavailable(err: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(err.to_string())
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let limit = self.policy.limit_for(key.scope);
        let storage_key = key.storage_key();
        let mut conn = self.conn.clone();

        let count: i64 = conn.incr(&storage_key, 1_i64).await.map_err(unavailable)?;
        if count == 1 {
            conn.expire::<_, ()>(&storage_key, i64::from(limit.window_secs))
                .await
                .map_err(unavailable)?;
        }
        let ttl: i64 = conn.ttl(&storage_key).await.map_err(unavailable)?;
        let resets_in = if ttl > 0 { ttl } else { i64::from(limit.window_secs) };

        if count > i64::from(limit.requests) {
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit: limit.requests,
                retry_after_secs: u32::try_from(resets_in).unwrap_or(u32::MAX).max(1),
                scope: key.scope,
            }));
        }
        let used = u32::try_from(count).unwrap_or(u32::MAX);
        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit: limit.requests,
            remaining: limit.requests.saturating_sub(used),
            reset_at: Timestamp::now().plus_secs(resets_in),
        }))
    }

    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key.storage_key()).await.map_err(unavailable)
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
