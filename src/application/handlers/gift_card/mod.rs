//! Gift card handlers.

mod change_gift_card_status;
mod delete_gift_card;
mod get_gift_card;
mod issue_gift_card;
mod redeem_gift_card;
mod top_up_gift_card;

pub use change_gift_card_status::{ChangeGiftCardStatusHandler, GiftCardStatusChange};
pub use delete_gift_card::DeleteGiftCardHandler;
pub use get_gift_card::{GetGiftCardHandler, GiftCardView};
pub use issue_gift_card::{IssueGiftCardCommand, IssueGiftCardHandler};
pub use redeem_gift_card::{RedeemGiftCardCommand, RedeemGiftCardHandler, RedeemGiftCardResult};
pub use top_up_gift_card::{TopUpGiftCardCommand, TopUpGiftCardHandler};
