//! Application handlers.
//!
//! One command or query handler per operation. Handlers receive a
//! [`TenantContext`](crate::domain::tenancy::TenantContext) that has already
//! passed the access gate, run their mutation as one unit of work through a
//! repository port, then notify best-effort.

pub mod audit_log;
pub mod gift_card;
pub mod order;
pub mod payment;
pub mod pos;
pub mod session_credit;
pub mod tenancy;
pub mod voucher;

#[cfg(test)]
pub(crate) mod test_support;
