//! IssueGiftCardHandler - staff issue a new card with its purchase row.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Currency, EventId, Money, Timestamp, UserId};
use crate::domain::ledger::{GiftCard, GiftCardCode, GiftCardIssued, IssueGiftCard, LedgerError};
use crate::domain::tenancy::TenantContext;
use crate::ports::GiftCardRepository;

/// Generated codes collide rarely; a collision just draws a new code.
const CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct IssueGiftCardCommand {
    pub initial_balance: i64,
    pub currency: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
    pub purchased_by: Option<UserId>,
}

pub struct IssueGiftCardHandler {
    cards: Arc<dyn GiftCardRepository>,
    notifier: Notifier,
}

impl IssueGiftCardHandler {
    pub fn new(cards: Arc<dyn GiftCardRepository>, notifier: Notifier) -> Self {
        Self { cards, notifier }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: IssueGiftCardCommand,
    ) -> Result<GiftCard, LedgerError> {
        let currency = match cmd.currency.as_deref() {
            Some(code) => Currency::new(code)?,
            None => Currency::default(),
        };
        let request = IssueGiftCard {
            initial_balance: Money::from_cents(cmd.initial_balance),
            currency,
            expires_at: cmd.expires_at,
            recipient_name: cmd.recipient_name,
            recipient_email: cmd.recipient_email,
            message: cmd.message,
            purchased_by: cmd.purchased_by,
        };

        let mut attempt = 0;
        let card = loop {
            attempt += 1;
            let now = Timestamp::now();
            let (card, purchase) = GiftCard::issue(
                ctx.tenant_id,
                GiftCardCode::generate(),
                request.clone(),
                ctx.user_id,
                now,
            )?;
            let audit = AuditEntry::record(
                ctx.actor(),
                Some(ctx.tenant_id),
                AuditAction::GiftCardCreated,
                "gift_card",
                card.id,
            )
            .with_metadata(json!({
                "code": card.code,
                "initial_balance": card.initial_balance,
                "currency": card.currency,
            }))
            .at(now);

            match self.cards.issue(&card, &purchase, &audit).await {
                Ok(()) => break card,
                Err(LedgerError::Conflict(_)) if attempt < CODE_ATTEMPTS => {
                    tracing::debug!(tenant_id = %ctx.tenant_id, attempt, "Gift card code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            gift_card_id = %card.id,
            balance = %card.initial_balance,
            "Gift card issued"
        );
        self.notifier
            .notify(&GiftCardIssued {
                event_id: EventId::new(),
                tenant_id: card.tenant_id,
                gift_card_id: card.id,
                code: card.code.to_string(),
                initial_balance: card.initial_balance,
                purchased_by: card.purchased_by,
                occurred_at: card.created_at,
            })
            .await;
        Ok(card)
    }
}
