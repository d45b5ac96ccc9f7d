//! Event publisher adapters.
//!
//! - `InMemoryEventBus` - captures envelopes for tests
//! - `RealtimeHub` - fans envelopes out to tenant and user rooms that
//!   WebSocket clients subscribe to

mod in_memory;
mod realtime_hub;

pub use in_memory::InMemoryEventBus;
pub use realtime_hub::{RealtimeHub, Room};
