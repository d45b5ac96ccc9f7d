//! Cancel and reactivate gift cards (admin).

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::Timestamp;
use crate::domain::ledger::{GiftCard, GiftCardCode, LedgerError};
use crate::domain::tenancy::TenantContext;
use crate::ports::{GiftCardRepository, Mutation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftCardStatusChange {
    Cancel,
    Reactivate,
}

impl GiftCardStatusChange {
    fn action(self) -> AuditAction {
        match self {
            GiftCardStatusChange::Cancel => AuditAction::GiftCardCancelled,
            GiftCardStatusChange::Reactivate => AuditAction::GiftCardReactivated,
        }
    }
}

pub struct ChangeGiftCardStatusHandler {
    cards: Arc<dyn GiftCardRepository>,
}

impl ChangeGiftCardStatusHandler {
    pub fn new(cards: Arc<dyn GiftCardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        code: &str,
        change: GiftCardStatusChange,
    ) -> Result<GiftCard, LedgerError> {
        let code = GiftCardCode::parse(code)?;
        let caller = *ctx;

        let mutated = self
            .cards
            .modify(ctx.tenant_id, &code, &|card| {
                let now = Timestamp::now();
                let previous = card.status;
                match change {
                    GiftCardStatusChange::Cancel => card.cancel(now)?,
                    GiftCardStatusChange::Reactivate => card.reactivate(now)?,
                }
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    change.action(),
                    "gift_card",
                    card.id,
                )
                .with_metadata(json!({ "previous_status": previous, "status": card.status }))
                .at(now);
                Ok(Mutation::audited(None, audit))
            })
            .await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            gift_card_id = %mutated.entity.id,
            status = mutated.entity.status.as_str(),
            "Gift card status changed"
        );
        Ok(mutated.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::domain::foundation::{Money, TenantId, UserId};
    use crate::domain::ledger::{GiftCardStatus, IssueGiftCard};
    use crate::domain::audit::AuditActor;
    use crate::domain::tenancy::Role;

    async fn card_with(store: &InMemoryStore, tenant: TenantId, expires_in_secs: Option<i64>) -> GiftCard {
        let now = Timestamp::now();
        let (card, purchase) = GiftCard::issue(
            tenant,
            GiftCardCode::generate(),
            IssueGiftCard {
                initial_balance: Money::from_cents(1000),
                expires_at: expires_in_secs.map(|s| now.plus_secs(s)),
                ..Default::default()
            },
            UserId::new(),
            now,
        )
        .unwrap();
        let audit = AuditEntry::record(AuditActor::system("fixture"), Some(tenant), AuditAction::GiftCardCreated, "gift_card", card.id);
        store.issue(&card, &purchase, &audit).await.unwrap();
        card
    }

    #[tokio::test]
    async fn cancel_then_reactivate() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let card = card_with(&store, tenant, None).await;
        let handler = ChangeGiftCardStatusHandler::new(Arc::new(store.clone()));

        let cancelled = handler
            .handle(&admin, card.code.as_str(), GiftCardStatusChange::Cancel)
            .await
            .unwrap();
        assert_eq!(cancelled.status, GiftCardStatus::Cancelled);

        let active = handler
            .handle(&admin, card.code.as_str(), GiftCardStatusChange::Reactivate)
            .await
            .unwrap();
        assert_eq!(active.status, GiftCardStatus::Active);
    }

    #[tokio::test]
    async fn reactivating_an_active_card_is_invalid() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let card = card_with(&store, tenant, None).await;

        let err = ChangeGiftCardStatusHandler::new(Arc::new(store))
            .handle(&admin, card.code.as_str(), GiftCardStatusChange::Reactivate)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn expired_card_cannot_be_reactivated() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let card = card_with(&store, tenant, Some(3600)).await;
        let handler = ChangeGiftCardStatusHandler::new(Arc::new(store.clone()));
        handler
            .handle(&admin, card.code.as_str(), GiftCardStatusChange::Cancel)
            .await
            .unwrap();

        // Push the stored expiry into the past.
        GiftCardRepository::modify(&store, tenant, &card.code, &|c| {
            c.expires_at = Some(Timestamp::now().plus_secs(-60));
            let audit = AuditEntry::record(AuditActor::system("fixture"), Some(tenant), AuditAction::Other("fixture".into()), "gift_card", c.id);
            Ok(Mutation::audited(None, audit))
        })
        .await
        .unwrap();

        let err = handler
            .handle(&admin, card.code.as_str(), GiftCardStatusChange::Reactivate)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Expired));
    }
}
