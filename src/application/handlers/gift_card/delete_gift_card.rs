//! DeleteGiftCardHandler - admin removes a cancelled card.
//!
//! The card and its transaction rows go; the `gift_card.deleted` audit row
//! stays.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::ledger::{GiftCard, GiftCardCode, LedgerError};
use crate::domain::tenancy::TenantContext;
use crate::ports::GiftCardRepository;

pub struct DeleteGiftCardHandler {
    cards: Arc<dyn GiftCardRepository>,
}

impl DeleteGiftCardHandler {
    pub fn new(cards: Arc<dyn GiftCardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(&self, ctx: &TenantContext, code: &str) -> Result<GiftCard, LedgerError> {
        let code = GiftCardCode::parse(code)?;
        let caller = *ctx;
        let card = self
            .cards
            .delete(ctx.tenant_id, &code, &|card| {
                card.ensure_deletable()?;
                Ok(AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::GiftCardDeleted,
                    "gift_card",
                    card.id,
                )
                .with_metadata(json!({
                    "code": card.code,
                    "balance_at_deletion": card.current_balance,
                })))
            })
            .await?;
        tracing::info!(tenant_id = %ctx.tenant_id, gift_card_id = %card.id, "Gift card deleted");
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::gift_card::{
        ChangeGiftCardStatusHandler, GiftCardStatusChange, IssueGiftCardCommand,
        IssueGiftCardHandler,
    };
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::application::Notifier;
    use crate::domain::tenancy::Role;

    #[tokio::test]
    async fn only_cancelled_cards_are_deleted_and_audit_survives() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let card = IssueGiftCardHandler::new(
            Arc::new(store.clone()),
            Notifier::new(Arc::new(InMemoryEventBus::new())),
        )
        .handle(
            &admin,
            IssueGiftCardCommand {
                initial_balance: 800,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let handler = DeleteGiftCardHandler::new(Arc::new(store.clone()));

        let err = handler.handle(&admin, card.code.as_str()).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));

        ChangeGiftCardStatusHandler::new(Arc::new(store.clone()))
            .handle(&admin, card.code.as_str(), GiftCardStatusChange::Cancel)
            .await
            .unwrap();
        handler.handle(&admin, card.code.as_str()).await.unwrap();

        assert!(store.find_by_code(tenant, &card.code).await.unwrap().is_none());
        assert!(store.history(tenant, card.id).await.unwrap().is_empty());
        assert!(store
            .audit_entries()
            .await
            .iter()
            .any(|e| e.action == AuditAction::GiftCardDeleted && e.resource_id == card.id.to_string()));
    }
}
