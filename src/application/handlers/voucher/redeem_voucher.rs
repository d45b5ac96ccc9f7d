//! RedeemVoucherHandler - a customer applies a voucher to an order amount.
//!
//! The use-count check and increment run under the voucher's row lock, so
//! a voucher with `max_uses = n` is never redeemed more than n times.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, Money, Timestamp, VoucherId};
use crate::domain::ledger::{LedgerError, VoucherRedeemed};
use crate::domain::tenancy::TenantContext;
use crate::ports::{Mutation, VoucherRepository};

#[derive(Debug, Clone)]
pub struct RedeemVoucherCommand {
    pub voucher_id: VoucherId,
    pub order_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemVoucherResult {
    pub discount_amount: Money,
    pub used_count: u32,
    pub grants_free_session: bool,
}

pub struct RedeemVoucherHandler {
    vouchers: Arc<dyn VoucherRepository>,
    notifier: Notifier,
}

impl RedeemVoucherHandler {
    pub fn new(vouchers: Arc<dyn VoucherRepository>, notifier: Notifier) -> Self {
        Self { vouchers, notifier }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: RedeemVoucherCommand,
    ) -> Result<RedeemVoucherResult, LedgerError> {
        let order_amount = Money::from_cents(cmd.order_amount);
        let caller = *ctx;

        let mutated = self
            .vouchers
            .modify(ctx.tenant_id, cmd.voucher_id, &|voucher| {
                let now = Timestamp::now();
                let redemption = voucher.redeem(caller.user_id, order_amount, now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::VoucherRedeemed,
                    "voucher",
                    voucher.id,
                )
                .with_metadata(json!({
                    "order_amount": order_amount,
                    "discount_amount": redemption.discount_amount,
                    "used_count": voucher.used_count,
                }))
                .at(now);
                Ok(Mutation::audited(Some(redemption), audit))
            })
            .await?;

        let voucher = mutated.entity;
        let redemption = mutated
            .child
            .ok_or_else(|| LedgerError::infrastructure("redemption row missing"))?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            voucher_id = %voucher.id,
            discount = %redemption.discount_amount,
            used_count = voucher.used_count,
            "Voucher redeemed"
        );
        self.notifier
            .notify(&VoucherRedeemed {
                event_id: EventId::new(),
                tenant_id: voucher.tenant_id,
                voucher_id: voucher.id,
                user_id: ctx.user_id,
                discount_amount: redemption.discount_amount,
                used_count: voucher.used_count,
                occurred_at: redemption.created_at,
            })
            .await;

        Ok(RedeemVoucherResult {
            discount_amount: redemption.discount_amount,
            used_count: voucher.used_count,
            grants_free_session: voucher.grants_free_session(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::application::handlers::voucher::CreateVoucherHandler;
    use crate::domain::ledger::{NewVoucher, VoucherType};
    use crate::domain::tenancy::Role;

    #[tokio::test]
    async fn single_use_percentage_voucher() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let customer = seed_member(&store, tenant, Role::Customer).await;
        let voucher = CreateVoucherHandler::new(Arc::new(store.clone()))
            .handle(
                &admin,
                NewVoucher {
                    code: "TENOFF".into(),
                    voucher_type: VoucherType::Percentage,
                    value: 10,
                    max_uses: Some(1),
                    expires_at: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        let handler = RedeemVoucherHandler::new(
            Arc::new(store.clone()),
            Notifier::new(Arc::new(InMemoryEventBus::new())),
        );
        let cmd = RedeemVoucherCommand {
            voucher_id: voucher.id,
            order_amount: 10_000,
        };

        let result = handler.handle(&customer, cmd.clone()).await.unwrap();
        assert_eq!(result.discount_amount, Money::from_cents(1000));
        assert_eq!(result.used_count, 1);
        assert!(!result.grants_free_session);

        let err = handler.handle(&customer, cmd).await.unwrap_err();
        assert!(matches!(err, LedgerError::MaxUsesReached));
        assert_eq!(store.redemptions(tenant, voucher.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn free_session_voucher_reports_grant() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let voucher = CreateVoucherHandler::new(Arc::new(store.clone()))
            .handle(
                &admin,
                NewVoucher {
                    code: "FREEBIE".into(),
                    voucher_type: VoucherType::FreeSession,
                    value: 1,
                    max_uses: None,
                    expires_at: None,
                    description: None,
                },
            )
            .await
            .unwrap();

        let result = RedeemVoucherHandler::new(
            Arc::new(store.clone()),
            Notifier::new(Arc::new(InMemoryEventBus::new())),
        )
        .handle(
            &admin,
            RedeemVoucherCommand {
                voucher_id: voucher.id,
                order_amount: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(result.discount_amount, Money::ZERO);
        assert!(result.grants_free_session);
    }
}
