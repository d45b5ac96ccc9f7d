//! Voucher handlers.

mod create_voucher;
mod deactivate_voucher;
mod redeem_voucher;

pub use create_voucher::CreateVoucherHandler;
pub use deactivate_voucher::DeactivateVoucherHandler;
pub use redeem_voucher::{RedeemVoucherCommand, RedeemVoucherHandler, RedeemVoucherResult};
