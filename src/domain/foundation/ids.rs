//! Strongly-typed identifier value objects.
//!
//! Every persisted entity is keyed by a UUID wrapped in its own newtype so
//! a gift card id can never be passed where a tenant id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a tenant (an isolated business account).
    TenantId
);
uuid_id!(
    /// Internal user identifier. Never changes once a user is created.
    UserId
);
uuid_id!(
    /// Unique identifier for a tenant membership row.
    MembershipId
);
uuid_id!(
    /// Unique identifier for a gift card.
    GiftCardId
);
uuid_id!(
    /// Unique identifier for a gift card ledger row.
    GiftCardTransactionId
);
uuid_id!(
    /// Unique identifier for a voucher.
    VoucherId
);
uuid_id!(
    /// Unique identifier for a voucher redemption row.
    VoucherRedemptionId
);
uuid_id!(
    /// Unique identifier for a session package.
    SessionPackageId
);
uuid_id!(
    /// Unique identifier for a session credit.
    SessionCreditId
);
uuid_id!(
    /// Unique identifier for a session log row.
    SessionLogId
);
uuid_id!(
    /// Unique identifier for a booking in the scheduling collaborator.
    BookingId
);
uuid_id!(
    /// Unique identifier for a catalog product.
    ProductId
);
uuid_id!(
    /// Unique identifier for an order.
    OrderId
);
uuid_id!(
    /// Unique identifier for a point-of-sale transaction.
    PosTransactionId
);
uuid_id!(
    /// Unique identifier for a payment.
    PaymentId
);
uuid_id!(
    /// Unique identifier for a tenant subscription.
    SubscriptionId
);
uuid_id!(
    /// Unique identifier for an audit log row.
    AuditLogId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(TenantId::new(), TenantId::new());
    }

    #[test]
    fn id_round_trips_through_display_and_parse() {
        let id = GiftCardId::new();
        let parsed: GiftCardId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<OrderId>().is_err());
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
