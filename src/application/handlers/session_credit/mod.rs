//! Session package, credit and log handlers.

mod create_package;
mod grant_credit;
mod log_session;

pub use create_package::{CreatePackageCommand, CreatePackageHandler};
pub use grant_credit::{GrantCreditCommand, GrantCreditHandler};
pub use log_session::{LogSessionHandler, LogSessionResult};
