//! Payment module - gateway payments, tenant subscriptions and webhook
//! verification.
//!
//! Webhooks are verified here and reduced to a [`GatewayUpdate`]; the
//! reconciler in the application layer applies it to the stored record.

mod aggregate;
mod events;
mod gateway_update;
mod revenue_monster;
mod status;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use aggregate::{Payment, Reconciliation, Subscription};
pub use events::{PaymentStatusChanged, SubscriptionStatusChanged};
pub use gateway_update::GatewayUpdate;
#[cfg(any(test, feature = "test-util"))]
pub use revenue_monster::sign_revenue_monster_payload;
pub use revenue_monster::{
    signing_string, RevenueMonsterHeaders, RevenueMonsterNotification, RevenueMonsterVerifier,
};
pub use status::{Gateway, PaymentStatus, SubscriptionStatus};
pub use stripe_event::{StripeEvent, StripeEventType};
pub use webhook_errors::WebhookError;
#[cfg(any(test, feature = "test-util"))]
pub use webhook_verifier::sign_stripe_payload;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};
