//! Domain layer - pure types and invariants.
//!
//! Nothing in here performs I/O. Ports describe what the domain needs from
//! the outside world; adapters provide it.

pub mod audit;
pub mod foundation;
pub mod ledger;
pub mod payment;
pub mod tenancy;
