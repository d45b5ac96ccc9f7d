//! Rate limiter adapters.
//!
//! - `InMemoryRateLimiter` - single instance, tests and local runs
//! - `RedisRateLimiter` - windows shared across instances

mod in_memory;
mod policy;
mod redis;

pub use in_memory::InMemoryRateLimiter;
pub use policy::{RateLimitPolicy, WindowLimit};
pub use redis::RedisRateLimiter;
