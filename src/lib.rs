//! Tenant Ledger - multi-tenant authorization and ledger-consistent commerce.
//!
//! Every tenant-scoped request passes the access gate, which resolves the
//! caller's membership and role. Ledger mutations (gift cards, vouchers,
//! session credits, point-of-sale, orders) run under a row lock and commit
//! together with their audit entry. Payment gateways reconcile through
//! signed webhooks.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
