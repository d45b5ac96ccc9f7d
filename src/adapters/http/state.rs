//! Shared application state for the router.

use std::sync::Arc;

use crate::adapters::events::RealtimeHub;
use crate::application::handlers::payment::WebhookReconciler;
use crate::application::{AccessGate, IdentityResolver, Notifier, Repositories};
use crate::domain::foundation::TenantId;
use crate::domain::payment::{RevenueMonsterVerifier, StripeWebhookVerifier};
use crate::domain::tenancy::{PlatformContext, Role, TenantContext, User};
use crate::ports::{EventPublisher, IdentityProviderMirror, SessionValidator};

use super::error::ApiError;

/// Gateway verifiers available on this deployment. A gateway left as
/// `None` answers its webhooks with 503.
#[derive(Default)]
pub struct WebhookVerifiers {
    pub stripe: Option<StripeWebhookVerifier>,
    pub revenue_monster: Option<RevenueMonsterVerifier>,
}

/// Cloned per request; every dependency sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub gate: AccessGate,
    pub identity: IdentityResolver,
    pub notifier: Notifier,
    pub mirror: Arc<dyn IdentityProviderMirror>,
    pub hub: Arc<RealtimeHub>,
    pub reconciler: Arc<WebhookReconciler>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        validator: Arc<dyn SessionValidator>,
        publisher: Arc<dyn EventPublisher>,
        hub: Arc<RealtimeHub>,
        mirror: Arc<dyn IdentityProviderMirror>,
        verifiers: WebhookVerifiers,
    ) -> Self {
        let notifier = Notifier::new(publisher);

        let mut reconciler = WebhookReconciler::new(
            repos.payments.clone(),
            repos.subscriptions.clone(),
            notifier.clone(),
        );
        if let Some(stripe) = verifiers.stripe {
            reconciler = reconciler.with_stripe(stripe);
        }
        if let Some(revenue_monster) = verifiers.revenue_monster {
            reconciler = reconciler.with_revenue_monster(revenue_monster);
        }

        Self {
            gate: AccessGate::new(repos.tenants.clone(), repos.memberships.clone()),
            identity: IdentityResolver::new(validator, repos.users.clone()),
            notifier,
            mirror,
            hub,
            reconciler: Arc::new(reconciler),
            repos,
        }
    }

    /// Passes the access gate for `tenant_id` with at least `minimum`.
    pub async fn tenant(
        &self,
        user: &User,
        tenant_id: TenantId,
        minimum: Role,
    ) -> Result<TenantContext, ApiError> {
        Ok(self.gate.authorize(user.id, tenant_id, &[minimum]).await?)
    }

    pub async fn platform(&self, user: &User) -> Result<PlatformContext, ApiError> {
        Ok(self.gate.require_platform_admin(user.id).await?)
    }
}
