//! Point-of-sale handlers.

mod create_pos_transaction;
mod get_pos_transaction;
mod void_pos_transaction;

pub use create_pos_transaction::CreatePosTransactionHandler;
pub use get_pos_transaction::GetPosTransactionHandler;
pub use void_pos_transaction::{VoidPosTransactionCommand, VoidPosTransactionHandler};
