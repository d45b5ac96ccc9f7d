//! GetGiftCardHandler - card with its transaction history.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::ledger::{GiftCard, GiftCardCode, GiftCardTransaction, LedgerError};
use crate::domain::tenancy::TenantContext;
use crate::ports::GiftCardRepository;

#[derive(Debug, Clone, Serialize)]
pub struct GiftCardView {
    pub card: GiftCard,
    pub transactions: Vec<GiftCardTransaction>,
}

pub struct GetGiftCardHandler {
    cards: Arc<dyn GiftCardRepository>,
}

impl GetGiftCardHandler {
    pub fn new(cards: Arc<dyn GiftCardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(&self, ctx: &TenantContext, code: &str) -> Result<GiftCardView, LedgerError> {
        let code = GiftCardCode::parse(code)?;
        let card = self
            .cards
            .find_by_code(ctx.tenant_id, &code)
            .await?
            .ok_or(LedgerError::not_found("gift_card"))?;
        let transactions = self.cards.history(ctx.tenant_id, card.id).await?;
        Ok(GiftCardView { card, transactions })
    }
}
