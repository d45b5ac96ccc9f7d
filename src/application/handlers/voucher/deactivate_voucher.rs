//! DeactivateVoucherHandler - admin stops a voucher from being redeemed.

use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Timestamp, VoucherId};
use crate::domain::ledger::{LedgerError, Voucher};
use crate::domain::tenancy::TenantContext;
use crate::ports::{Mutation, VoucherRepository};

pub struct DeactivateVoucherHandler {
    vouchers: Arc<dyn VoucherRepository>,
}

impl DeactivateVoucherHandler {
    pub fn new(vouchers: Arc<dyn VoucherRepository>) -> Self {
        Self { vouchers }
    }

    pub async fn handle(&self, ctx: &TenantContext, voucher_id: VoucherId) -> Result<Voucher, LedgerError> {
        let caller = *ctx;
        let mutated = self
            .vouchers
            .modify(ctx.tenant_id, voucher_id, &|voucher| {
                let now = Timestamp::now();
                voucher.deactivate(now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::VoucherDeactivated,
                    "voucher",
                    voucher.id,
                )
                .at(now);
                Ok(Mutation::audited(None, audit))
            })
            .await?;
        tracing::info!(tenant_id = %ctx.tenant_id, %voucher_id, "Voucher deactivated");
        Ok(mutated.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::application::handlers::voucher::{
        CreateVoucherHandler, RedeemVoucherCommand, RedeemVoucherHandler,
    };
    use crate::application::Notifier;
    use crate::domain::ledger::{NewVoucher, VoucherType};
    use crate::domain::tenancy::Role;

    #[tokio::test]
    async fn deactivated_voucher_is_inactive() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let voucher = CreateVoucherHandler::new(Arc::new(store.clone()))
            .handle(
                &admin,
                NewVoucher {
                    code: "FLAT5".into(),
                    voucher_type: VoucherType::Fixed,
                    value: 500,
                    max_uses: None,
                    expires_at: None,
                    description: None,
                },
            )
            .await
            .unwrap();

        let voucher = DeactivateVoucherHandler::new(Arc::new(store.clone()))
            .handle(&admin, voucher.id)
            .await
            .unwrap();
        assert!(!voucher.is_active);

        let err = RedeemVoucherHandler::new(
            Arc::new(store.clone()),
            Notifier::new(Arc::new(InMemoryEventBus::new())),
        )
        .handle(
            &admin,
            RedeemVoucherCommand {
                voucher_id: voucher.id,
                order_amount: 2000,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::Inactive));
    }
}
