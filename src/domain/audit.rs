//! Audit trail entries.
//!
//! One immutable row per mutation. Entries are built by the aggregate's
//! service and handed to the same repository call that persists the
//! mutation, so both commit or neither does.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::foundation::{AuditLogId, TenantId, Timestamp, UserId};

/// Audited action names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AuditAction {
    // Platform
    TenantCreated,
    TenantStatusChanged,

    // Memberships
    MembershipJoined,
    MembershipInvited,
    MembershipAccepted,
    MembershipRoleChanged,
    MembershipRemoved,

    // Gift cards
    GiftCardCreated,
    GiftCardRedeemed,
    GiftCardToppedUp,
    GiftCardCancelled,
    GiftCardReactivated,
    GiftCardDeleted,

    // Vouchers
    VoucherCreated,
    VoucherRedeemed,
    VoucherDeactivated,

    // Session credits
    SessionPackageCreated,
    SessionCreditGranted,
    SessionLogged,

    // Point of sale
    PosTransactionCreated,
    PosTransactionVoided,

    // Orders and payments
    OrderCreated,
    OrderStatusUpdated,
    PaymentRecorded,
    PaymentStatusUpdated,
    SubscriptionLinked,
    SubscriptionStatusUpdated,

    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::TenantCreated => "tenant.created",
            AuditAction::TenantStatusChanged => "tenant.status_changed",
            AuditAction::MembershipJoined => "membership.joined",
            AuditAction::MembershipInvited => "membership.invited",
            AuditAction::MembershipAccepted => "membership.accepted",
            AuditAction::MembershipRoleChanged => "membership.role_changed",
            AuditAction::MembershipRemoved => "membership.removed",
            AuditAction::GiftCardCreated => "gift_card.created",
            AuditAction::GiftCardRedeemed => "gift_card.redeemed",
            AuditAction::GiftCardToppedUp => "gift_card.topped_up",
            AuditAction::GiftCardCancelled => "gift_card.cancelled",
            AuditAction::GiftCardReactivated => "gift_card.reactivated",
            AuditAction::GiftCardDeleted => "gift_card.deleted",
            AuditAction::VoucherCreated => "voucher.created",
            AuditAction::VoucherRedeemed => "voucher.redeemed",
            AuditAction::VoucherDeactivated => "voucher.deactivated",
            AuditAction::SessionPackageCreated => "session_package.created",
            AuditAction::SessionCreditGranted => "session_credit.granted",
            AuditAction::SessionLogged => "session.logged",
            AuditAction::PosTransactionCreated => "pos_transaction.created",
            AuditAction::PosTransactionVoided => "pos_transaction.voided",
            AuditAction::OrderCreated => "order.created",
            AuditAction::OrderStatusUpdated => "order.status_updated",
            AuditAction::PaymentRecorded => "payment.recorded",
            AuditAction::PaymentStatusUpdated => "payment.status_updated",
            AuditAction::SubscriptionLinked => "subscription.linked",
            AuditAction::SubscriptionStatusUpdated => "subscription.status_updated",
            AuditAction::Other(s) => s,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        action.as_str().to_string()
    }
}

impl From<String> for AuditAction {
    fn from(s: String) -> Self {
        const KNOWN: &[AuditAction] = &[
            AuditAction::TenantCreated,
            AuditAction::TenantStatusChanged,
            AuditAction::MembershipJoined,
            AuditAction::MembershipInvited,
            AuditAction::MembershipAccepted,
            AuditAction::MembershipRoleChanged,
            AuditAction::MembershipRemoved,
            AuditAction::GiftCardCreated,
            AuditAction::GiftCardRedeemed,
            AuditAction::GiftCardToppedUp,
            AuditAction::GiftCardCancelled,
            AuditAction::GiftCardReactivated,
            AuditAction::GiftCardDeleted,
            AuditAction::VoucherCreated,
            AuditAction::VoucherRedeemed,
            AuditAction::VoucherDeactivated,
            AuditAction::SessionPackageCreated,
            AuditAction::SessionCreditGranted,
            AuditAction::SessionLogged,
            AuditAction::PosTransactionCreated,
            AuditAction::PosTransactionVoided,
            AuditAction::OrderCreated,
            AuditAction::OrderStatusUpdated,
            AuditAction::PaymentRecorded,
            AuditAction::PaymentStatusUpdated,
            AuditAction::SubscriptionLinked,
            AuditAction::SubscriptionStatusUpdated,
        ];
        KNOWN
            .iter()
            .find(|a| a.as_str() == s)
            .cloned()
            .unwrap_or(AuditAction::Other(s))
    }
}

/// Who performed an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AuditActor {
    /// A resolved internal user.
    User(UserId),
    /// A non-human caller such as a payment gateway webhook.
    System(String),
}

impl AuditActor {
    pub fn system(name: impl Into<String>) -> Self {
        AuditActor::System(name.into())
    }

    pub fn actor_type(&self) -> &'static str {
        match self {
            AuditActor::User(_) => "user",
            AuditActor::System(_) => "system",
        }
    }

    /// Storage form of the actor identity.
    pub fn identity(&self) -> String {
        match self {
            AuditActor::User(id) => id.to_string(),
            AuditActor::System(name) => name.clone(),
        }
    }

    /// Rebuilds an actor from its stored type and identity.
    pub fn from_parts(actor_type: &str, identity: &str) -> Self {
        match (actor_type, identity.parse::<UserId>()) {
            ("user", Ok(id)) => AuditActor::User(id),
            _ => AuditActor::System(identity.to_string()),
        }
    }
}

/// Immutable audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditLogId,
    pub actor: AuditActor,
    /// Absent for platform-level actions.
    pub tenant_id: Option<TenantId>,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub metadata: JsonValue,
    pub created_at: Timestamp,
}

impl AuditEntry {
    pub fn record(
        actor: AuditActor,
        tenant_id: Option<TenantId>,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl ToString,
    ) -> Self {
        Self {
            id: AuditLogId::new(),
            actor,
            tenant_id,
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.to_string(),
            metadata: JsonValue::Object(Default::default()),
            created_at: Timestamp::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_strings_are_dotted() {
        assert_eq!(AuditAction::GiftCardRedeemed.to_string(), "gift_card.redeemed");
        assert_eq!(AuditAction::VoucherRedeemed.to_string(), "voucher.redeemed");
        assert_eq!(AuditAction::SessionLogged.to_string(), "session.logged");
    }

    #[test]
    fn action_parses_back_from_storage() {
        let action: AuditAction = "pos_transaction.voided".to_string().into();
        assert_eq!(action, AuditAction::PosTransactionVoided);

        let custom: AuditAction = "legacy.thing".to_string().into();
        assert_eq!(custom, AuditAction::Other("legacy.thing".to_string()));
    }

    #[test]
    fn actor_round_trips_through_parts() {
        let user = UserId::new();
        let actor = AuditActor::User(user);
        assert_eq!(
            AuditActor::from_parts(actor.actor_type(), &actor.identity()),
            actor
        );

        let system = AuditActor::system("webhook:stripe");
        assert_eq!(
            AuditActor::from_parts(system.actor_type(), &system.identity()),
            system
        );
    }

    #[test]
    fn record_defaults_to_empty_metadata() {
        let entry = AuditEntry::record(
            AuditActor::system("test"),
            None,
            AuditAction::TenantCreated,
            "tenant",
            "t-1",
        )
        .with_metadata(json!({"slug": "acme"}));

        assert_eq!(entry.metadata["slug"], "acme");
        assert!(entry.tenant_id.is_none());
    }
}
