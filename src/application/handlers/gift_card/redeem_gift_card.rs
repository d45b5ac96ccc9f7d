//! RedeemGiftCardHandler - staff redeem value from a card.
//!
//! Validation and the balance decrement happen inside the repository's
//! locked unit of work, so concurrent redemptions serialize on the card row
//! and the balance never goes negative.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, Money, Timestamp};
use crate::domain::ledger::{
    GiftCard, GiftCardCode, GiftCardRedeemed, GiftCardStatus, GiftCardTransaction, LedgerError,
};
use crate::domain::tenancy::TenantContext;
use crate::ports::{GiftCardRepository, Mutation};

#[derive(Debug, Clone)]
pub struct RedeemGiftCardCommand {
    pub code: String,
    pub amount: i64,
    pub reference: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RedeemGiftCardResult {
    pub card: GiftCard,
    pub transaction: GiftCardTransaction,
}

pub struct RedeemGiftCardHandler {
    cards: Arc<dyn GiftCardRepository>,
    notifier: Notifier,
}

impl RedeemGiftCardHandler {
    pub fn new(cards: Arc<dyn GiftCardRepository>, notifier: Notifier) -> Self {
        Self { cards, notifier }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: RedeemGiftCardCommand,
    ) -> Result<RedeemGiftCardResult, LedgerError> {
        let code = GiftCardCode::parse(&cmd.code)?;
        let amount = Money::from_cents(cmd.amount);
        let caller = *ctx;
        let reference = cmd.reference;

        let mutated = self
            .cards
            .modify(ctx.tenant_id, &code, &|card| {
                let now = Timestamp::now();
                let row = card.redeem(amount, caller.user_id, reference.clone(), now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::GiftCardRedeemed,
                    "gift_card",
                    card.id,
                )
                .with_metadata(json!({
                    "amount": amount,
                    "balance_after": card.current_balance,
                    "reference": row.reference,
                }))
                .at(now);
                Ok(Mutation::audited(Some(row), audit))
            })
            .await?;

        let card = mutated.entity;
        let transaction = mutated
            .child
            .ok_or_else(|| LedgerError::infrastructure("redemption row missing"))?;

        tracing::info!(
            tenant_id = %card.tenant_id,
            gift_card_id = %card.id,
            %amount,
            balance = %card.current_balance,
            "Gift card redeemed"
        );
        self.notifier
            .notify(&GiftCardRedeemed {
                event_id: EventId::new(),
                tenant_id: card.tenant_id,
                gift_card_id: card.id,
                amount,
                remaining_balance: card.current_balance,
                depleted: card.status == GiftCardStatus::Depleted,
                occurred_at: transaction.created_at,
            })
            .await;

        Ok(RedeemGiftCardResult { card, transaction })
    }
}
