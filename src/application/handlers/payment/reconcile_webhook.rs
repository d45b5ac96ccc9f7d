//! WebhookReconciler - verifies a gateway delivery and applies it to the
//! matching payment or subscription.
//!
//! Outcomes, and what the HTTP layer answers:
//!
//! | Outcome | Meaning | Response |
//! |---------|---------|----------|
//! | `Applied` | status moved forward, audited and notified | 200 |
//! | `Unchanged` | replay of an already-applied status | 200 |
//! | `Stale` | regression such as `processing` after `succeeded` | 200 |
//! | `NotFound` | no local record carries the reference | 200 |
//! | `Ignored` | event type or status outside the mapped vocabulary | 200 |
//!
//! Signature and parse failures surface as [`WebhookError`] (400). Only
//! storage failures are worth a gateway retry.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditActor, AuditEntry};
use crate::domain::foundation::{EventId, Timestamp};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::{
    Gateway, GatewayUpdate, PaymentStatus, PaymentStatusChanged, Reconciliation,
    RevenueMonsterHeaders, RevenueMonsterVerifier, StripeWebhookVerifier, SubscriptionStatus,
    SubscriptionStatusChanged, WebhookError,
};
use crate::ports::{Mutation, PaymentRepository, SubscriptionRepository};

/// Signature-related headers of one delivery. Which ones are required
/// depends on the gateway.
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub stripe_signature: Option<String>,
    pub signature: Option<String>,
    pub nonce_str: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReconcileWebhookCommand {
    pub gateway: Gateway,
    pub payload: Vec<u8>,
    pub headers: WebhookHeaders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    Unchanged,
    Stale,
    NotFound,
    Ignored,
}

pub struct WebhookReconciler {
    stripe: Option<StripeWebhookVerifier>,
    revenue_monster: Option<RevenueMonsterVerifier>,
    payments: Arc<dyn PaymentRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    notifier: Notifier,
}

impl WebhookReconciler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            stripe: None,
            revenue_monster: None,
            payments,
            subscriptions,
            notifier,
        }
    }

    pub fn with_stripe(mut self, verifier: StripeWebhookVerifier) -> Self {
        self.stripe = Some(verifier);
        self
    }

    pub fn with_revenue_monster(mut self, verifier: RevenueMonsterVerifier) -> Self {
        self.revenue_monster = Some(verifier);
        self
    }

    pub async fn handle(&self, cmd: ReconcileWebhookCommand) -> Result<ReconcileOutcome, WebhookError> {
        // 1. Verify the delivery and reduce it to a gateway-neutral update
        let update = self.verify(&cmd)?;
        tracing::debug!(gateway = %cmd.gateway, event_id = update.event_id(), "Webhook verified");

        // 2. Apply it under the record's row lock
        match update {
            GatewayUpdate::Payment {
                gateway,
                event_id,
                reference,
                status,
            } => self.apply_payment(gateway, &event_id, &reference, status).await,
            GatewayUpdate::Subscription {
                event_id,
                reference,
                status,
                current_period_end,
            } => {
                self.apply_subscription(&event_id, &reference, status, current_period_end)
                    .await
            }
            GatewayUpdate::Unmapped {
                gateway,
                event_id,
                event_type,
                raw_status,
            } => {
                tracing::info!(
                    %gateway,
                    %event_id,
                    %event_type,
                    raw_status = ?raw_status,
                    "Webhook event not mapped, acknowledged"
                );
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    fn verify(&self, cmd: &ReconcileWebhookCommand) -> Result<GatewayUpdate, WebhookError> {
        match cmd.gateway {
            Gateway::Stripe => {
                let verifier = self.stripe.as_ref().ok_or(WebhookError::NotConfigured("stripe"))?;
                let signature = cmd
                    .headers
                    .stripe_signature
                    .as_deref()
                    .ok_or(WebhookError::MissingHeader("Stripe-Signature"))?;
                verifier.verify_and_parse(&cmd.payload, signature)?.to_update()
            }
            Gateway::RevenueMonster => {
                let verifier = self
                    .revenue_monster
                    .as_ref()
                    .ok_or(WebhookError::NotConfigured("revenue_monster"))?;
                let headers = RevenueMonsterHeaders {
                    signature: cmd
                        .headers
                        .signature
                        .as_deref()
                        .ok_or(WebhookError::MissingHeader("X-Signature"))?,
                    nonce_str: cmd
                        .headers
                        .nonce_str
                        .as_deref()
                        .ok_or(WebhookError::MissingHeader("X-Nonce-Str"))?,
                    timestamp: cmd
                        .headers
                        .timestamp
                        .as_deref()
                        .ok_or(WebhookError::MissingHeader("X-Timestamp"))?,
                };
                Ok(verifier.verify_and_parse(&cmd.payload, headers)?.to_update())
            }
        }
    }

    async fn apply_payment(
        &self,
        gateway: Gateway,
        event_id: &str,
        reference: &str,
        status: PaymentStatus,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let actor = webhook_actor(gateway);
        let result = self
            .payments
            .reconcile_by_reference(gateway, reference, &|payment| {
                let now = Timestamp::now();
                let outcome = payment.reconcile(status, now);
                let Reconciliation::Applied { previous } = outcome else {
                    return Ok(Mutation::unchanged(outcome));
                };
                let audit = AuditEntry::record(
                    actor.clone(),
                    Some(payment.tenant_id),
                    AuditAction::PaymentStatusUpdated,
                    "payment",
                    payment.id,
                )
                .with_metadata(json!({
                    "previous_status": previous,
                    "status": payment.status,
                    "gateway_event_id": event_id,
                }))
                .at(now);
                Ok(Mutation::audited(outcome, audit))
            })
            .await
            .map_err(storage_error)?;

        let Some(mutated) = result else {
            tracing::info!(%gateway, %event_id, %reference, "Webhook for unknown payment, acknowledged");
            return Ok(ReconcileOutcome::NotFound);
        };
        let payment = mutated.entity;

        match mutated.child {
            Reconciliation::Applied { previous } => {
                tracing::info!(
                    tenant_id = %payment.tenant_id,
                    payment_id = %payment.id,
                    %previous,
                    status = %payment.status,
                    %event_id,
                    "Payment reconciled"
                );
                self.notifier
                    .notify(&PaymentStatusChanged {
                        event_id: EventId::new(),
                        tenant_id: payment.tenant_id,
                        payment_id: payment.id,
                        customer_id: payment.customer_id,
                        gateway,
                        previous_status: previous,
                        new_status: payment.status,
                        occurred_at: payment.updated_at,
                    })
                    .await;
                Ok(ReconcileOutcome::Applied)
            }
            Reconciliation::Unchanged => {
                tracing::debug!(payment_id = %payment.id, %event_id, "Webhook replay, payment unchanged");
                Ok(ReconcileOutcome::Unchanged)
            }
            Reconciliation::Stale { current } => {
                tracing::warn!(
                    payment_id = %payment.id,
                    %current,
                    incoming = %status,
                    %event_id,
                    "Stale payment status ignored"
                );
                Ok(ReconcileOutcome::Stale)
            }
        }
    }

    async fn apply_subscription(
        &self,
        event_id: &str,
        reference: &str,
        status: SubscriptionStatus,
        current_period_end: Option<Timestamp>,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let actor = webhook_actor(Gateway::Stripe);
        let result = self
            .subscriptions
            .reconcile_by_reference(reference, &|subscription| {
                let now = Timestamp::now();
                let outcome = subscription.reconcile(status, current_period_end, now);
                let Reconciliation::Applied { previous } = outcome else {
                    return Ok(Mutation::unchanged(outcome));
                };
                let audit = AuditEntry::record(
                    actor.clone(),
                    Some(subscription.tenant_id),
                    AuditAction::SubscriptionStatusUpdated,
                    "subscription",
                    subscription.id,
                )
                .with_metadata(json!({
                    "previous_status": previous,
                    "status": subscription.status,
                    "current_period_end": subscription.current_period_end,
                    "gateway_event_id": event_id,
                }))
                .at(now);
                Ok(Mutation::audited(outcome, audit))
            })
            .await
            .map_err(storage_error)?;

        let Some(mutated) = result else {
            tracing::info!(%event_id, %reference, "Webhook for unknown subscription, acknowledged");
            return Ok(ReconcileOutcome::NotFound);
        };
        let subscription = mutated.entity;

        match mutated.child {
            Reconciliation::Applied { previous } => {
                tracing::info!(
                    tenant_id = %subscription.tenant_id,
                    subscription_id = %subscription.id,
                    %previous,
                    status = %subscription.status,
                    "Subscription reconciled"
                );
                if previous != subscription.status {
                    self.notifier
                        .notify(&SubscriptionStatusChanged {
                            event_id: EventId::new(),
                            tenant_id: subscription.tenant_id,
                            subscription_id: subscription.id,
                            previous_status: previous,
                            new_status: subscription.status,
                            occurred_at: subscription.updated_at,
                        })
                        .await;
                }
                Ok(ReconcileOutcome::Applied)
            }
            Reconciliation::Unchanged => Ok(ReconcileOutcome::Unchanged),
            Reconciliation::Stale { current } => {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    %current,
                    incoming = %status,
                    "Stale subscription status ignored"
                );
                Ok(ReconcileOutcome::Stale)
            }
        }
    }
}

fn webhook_actor(gateway: Gateway) -> AuditActor {
    AuditActor::system(format!("webhook:{}", gateway))
}

fn storage_error(err: LedgerError) -> WebhookError {
    WebhookError::Database(err.to_string())
}
