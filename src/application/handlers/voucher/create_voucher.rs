//! CreateVoucherHandler - admin creates a discount or free-session voucher.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::Timestamp;
use crate::domain::ledger::{LedgerError, NewVoucher, Voucher};
use crate::domain::tenancy::TenantContext;
use crate::ports::VoucherRepository;

pub struct CreateVoucherHandler {
    vouchers: Arc<dyn VoucherRepository>,
}

impl CreateVoucherHandler {
    pub fn new(vouchers: Arc<dyn VoucherRepository>) -> Self {
        Self { vouchers }
    }

    pub async fn handle(&self, ctx: &TenantContext, request: NewVoucher) -> Result<Voucher, LedgerError> {
        let now = Timestamp::now();
        let voucher = Voucher::create(ctx.tenant_id, request, ctx.user_id, now)?;
        let audit = AuditEntry::record(
            ctx.actor(),
            Some(ctx.tenant_id),
            AuditAction::VoucherCreated,
            "voucher",
            voucher.id,
        )
        .with_metadata(json!({
            "code": voucher.code,
            "type": voucher.voucher_type,
            "value": voucher.value,
            "max_uses": voucher.max_uses,
        }))
        .at(now);

        self.vouchers.create(&voucher, &audit).await?;
        tracing::info!(tenant_id = %ctx.tenant_id, voucher_id = %voucher.id, code = %voucher.code, "Voucher created");
        Ok(voucher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::domain::ledger::VoucherType;
    use crate::domain::tenancy::Role;

    fn request(code: &str, voucher_type: VoucherType, value: i64) -> NewVoucher {
        NewVoucher {
            code: code.into(),
            voucher_type,
            value,
            max_uses: None,
            expires_at: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn codes_are_unique_per_tenant() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let other = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let other_admin = seed_member(&store, other, Role::Admin).await;
        let handler = CreateVoucherHandler::new(Arc::new(store));

        handler.handle(&admin, request("SAVE10", VoucherType::Percentage, 10)).await.unwrap();
        let err = handler
            .handle(&admin, request("save10", VoucherType::Percentage, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        handler
            .handle(&other_admin, request("SAVE10", VoucherType::Percentage, 10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn percentage_above_100_is_rejected() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let err = CreateVoucherHandler::new(Arc::new(store))
            .handle(&admin, request("BIG", VoucherType::Percentage, 101))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }
}
