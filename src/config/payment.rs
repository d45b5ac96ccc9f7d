//! Payment gateway webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Webhook credentials for Stripe and Revenue Monster. A gateway without
/// credentials rejects its webhooks.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: Option<SecretString>,

    /// Revenue Monster RSA public key, PEM or bare base64 DER
    pub revenue_monster_public_key: Option<String>,

    /// The notify URL registered with Revenue Monster; part of the signed
    /// string.
    pub revenue_monster_notify_url: Option<String>,

    /// Maximum accepted age of a Stripe event in seconds
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
}

impl PaymentConfig {
    pub fn stripe_secret(&self) -> Option<&str> {
        self.stripe_webhook_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }

    /// Public key and notify URL, when Revenue Monster is configured.
    pub fn revenue_monster(&self) -> Option<(&str, &str)> {
        match (&self.revenue_monster_public_key, &self.revenue_monster_notify_url) {
            (Some(key), Some(url)) if !key.trim().is_empty() => Some((key.as_str(), url.as_str())),
            _ => None,
        }
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if let Some(secret) = self.stripe_secret() {
            if !secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        if self.revenue_monster_public_key.is_some() && self.revenue_monster_notify_url.is_none() {
            return Err(ValidationError::MissingRevenueMonsterNotifyUrl);
        }
        if production && self.stripe_secret().is_none() && self.revenue_monster().is_none() {
            return Err(ValidationError::NoGatewayConfigured);
        }
        if self.webhook_tolerance_secs <= 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_webhook_secret: None,
            revenue_monster_public_key: None,
            revenue_monster_notify_url: None,
            webhook_tolerance_secs: default_webhook_tolerance(),
        }
    }
}

fn default_webhook_tolerance() -> i64 {
    300
}
