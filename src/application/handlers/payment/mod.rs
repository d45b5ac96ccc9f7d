//! Payment handlers: staff-recorded payments, admin overrides, subscription
//! linking and gateway webhook reconciliation.

mod get_payment;
mod link_subscription;
mod reconcile_webhook;
mod record_payment;
mod update_payment_status;

pub use get_payment::GetPaymentHandler;
pub use link_subscription::{LinkSubscriptionCommand, LinkSubscriptionHandler};
pub use reconcile_webhook::{
    ReconcileOutcome, ReconcileWebhookCommand, WebhookHeaders, WebhookReconciler,
};
pub use record_payment::{RecordPaymentCommand, RecordPaymentHandler};
pub use update_payment_status::{UpdatePaymentStatusCommand, UpdatePaymentStatusHandler};
