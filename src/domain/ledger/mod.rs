//! Ledger module - balance and counter bearing entities.
//!
//! Aggregates here validate completely before mutating. Callers run each
//! mutation inside a unit of work that holds a row lock on the aggregate and
//! persists the returned child row and audit entry with it.

mod codes;
mod errors;
mod events;
mod gift_card;
mod order;
mod pos;
mod session_credit;
mod voucher;

pub use errors::LedgerError;
pub use events::{
    GiftCardIssued, GiftCardRedeemed, OrderCreated, OrderStatusChanged, PosTransactionCreated,
    PosTransactionVoided, SessionLogged, VoucherRedeemed,
};
pub use gift_card::{
    GiftCard, GiftCardCode, GiftCardStatus, GiftCardTransaction, GiftCardTransactionKind,
    IssueGiftCard,
};
pub use order::{Order, OrderItem, OrderLineRequest, OrderStatus, Product};
pub use pos::{
    NewPosTransaction, PaymentMethod, PosLineItem, PosStatus, PosTransaction, ReceiptNumber,
};
pub use session_credit::{NewSessionLog, SessionCredit, SessionLog, SessionPackage};
pub use voucher::{NewVoucher, Voucher, VoucherRedemption, VoucherType};
