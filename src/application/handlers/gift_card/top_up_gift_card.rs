//! TopUpGiftCardHandler - staff add value to an active or depleted card.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Money, Timestamp};
use crate::domain::ledger::{GiftCard, GiftCardCode, LedgerError};
use crate::domain::tenancy::TenantContext;
use crate::ports::{GiftCardRepository, Mutation};

#[derive(Debug, Clone)]
pub struct TopUpGiftCardCommand {
    pub code: String,
    pub amount: i64,
}

pub struct TopUpGiftCardHandler {
    cards: Arc<dyn GiftCardRepository>,
}

impl TopUpGiftCardHandler {
    pub fn new(cards: Arc<dyn GiftCardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: TopUpGiftCardCommand,
    ) -> Result<GiftCard, LedgerError> {
        let code = GiftCardCode::parse(&cmd.code)?;
        let amount = Money::from_cents(cmd.amount);
        let caller = *ctx;

        let mutated = self
            .cards
            .modify(ctx.tenant_id, &code, &|card| {
                let now = Timestamp::now();
                let previous_status = card.status;
                let row = card.top_up(amount, caller.user_id, now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::GiftCardToppedUp,
                    "gift_card",
                    card.id,
                )
                .with_metadata(json!({
                    "amount": amount,
                    "balance_after": card.current_balance,
                    "previous_status": previous_status,
                }))
                .at(now);
                Ok(Mutation::audited(Some(row), audit))
            })
            .await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            gift_card_id = %mutated.entity.id,
            %amount,
            "Gift card topped up"
        );
        Ok(mutated.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::gift_card::{
        IssueGiftCardCommand, IssueGiftCardHandler, RedeemGiftCardCommand, RedeemGiftCardHandler,
    };
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::application::Notifier;
    use crate::domain::ledger::GiftCardStatus;
    use crate::domain::tenancy::Role;

    #[tokio::test]
    async fn top_up_revives_a_depleted_card() {
        let store = InMemoryStore::new();
        let notifier = Notifier::new(Arc::new(InMemoryEventBus::new()));
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let card = IssueGiftCardHandler::new(Arc::new(store.clone()), notifier.clone())
            .handle(
                &staff,
                IssueGiftCardCommand {
                    initial_balance: 500,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        RedeemGiftCardHandler::new(Arc::new(store.clone()), notifier)
            .handle(
                &staff,
                RedeemGiftCardCommand {
                    code: card.code.to_string(),
                    amount: 500,
                    reference: None,
                },
            )
            .await
            .unwrap();

        let card = TopUpGiftCardHandler::new(Arc::new(store.clone()))
            .handle(
                &staff,
                TopUpGiftCardCommand {
                    code: card.code.to_string(),
                    amount: 1500,
                },
            )
            .await
            .unwrap();

        assert_eq!(card.status, GiftCardStatus::Active);
        assert_eq!(card.current_balance, Money::from_cents(1500));
        let history = store.history(tenant, card.id).await.unwrap();
        assert_eq!(GiftCard::ledger_balance(&history), card.current_balance);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let err = TopUpGiftCardHandler::new(Arc::new(store))
            .handle(
                &staff,
                TopUpGiftCardCommand {
                    code: "NOPE-NOPE".into(),
                    amount: 100,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
