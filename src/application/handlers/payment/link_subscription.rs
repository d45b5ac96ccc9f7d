//! LinkSubscriptionHandler - platform admin ties a tenant to its gateway
//! subscription so billing webhooks can find it.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{SubscriptionId, TenantId, Timestamp};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::{Subscription, SubscriptionStatus};
use crate::domain::tenancy::PlatformContext;
use crate::ports::{SubscriptionRepository, TenantRepository};

#[derive(Debug, Clone)]
pub struct LinkSubscriptionCommand {
    pub tenant_id: TenantId,
    pub gateway_subscription_id: String,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
}

pub struct LinkSubscriptionHandler {
    tenants: Arc<dyn TenantRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl LinkSubscriptionHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            tenants,
            subscriptions,
        }
    }

    pub async fn handle(
        &self,
        ctx: &PlatformContext,
        cmd: LinkSubscriptionCommand,
    ) -> Result<Subscription, LedgerError> {
        let gateway_id = cmd.gateway_subscription_id.trim();
        if gateway_id.is_empty() {
            return Err(LedgerError::validation(
                "gateway_subscription_id",
                "must not be empty",
            ));
        }
        if cmd.plan.trim().is_empty() {
            return Err(LedgerError::validation("plan", "must not be empty"));
        }
        if self.tenants.find_by_id(cmd.tenant_id).await?.is_none() {
            return Err(LedgerError::not_found("tenant"));
        }

        let now = Timestamp::now();
        let subscription = Subscription {
            id: SubscriptionId::new(),
            tenant_id: cmd.tenant_id,
            gateway_subscription_id: gateway_id.to_string(),
            plan: cmd.plan.trim().to_string(),
            status: cmd.status,
            current_period_end: cmd.current_period_end,
            created_at: now,
            updated_at: now,
        };
        let audit = AuditEntry::record(
            ctx.actor(),
            Some(cmd.tenant_id),
            AuditAction::SubscriptionLinked,
            "subscription",
            subscription.id,
        )
        .with_metadata(json!({
            "gateway_subscription_id": subscription.gateway_subscription_id,
            "plan": subscription.plan,
            "status": subscription.status,
        }))
        .at(now);

        self.subscriptions.create(&subscription, &audit).await?;
        tracing::info!(
            tenant_id = %cmd.tenant_id,
            subscription_id = %subscription.id,
            "Subscription linked"
        );
        Ok(subscription)
    }
}
