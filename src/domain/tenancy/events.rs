//! Tenancy events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, MembershipId, TenantId, Timestamp, UserId};
use crate::domain_event;

use super::Role;

/// A member's role changed. Delivered to the tenant room and the member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRoleChanged {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub membership_id: MembershipId,
    pub user_id: UserId,
    pub previous_role: Role,
    pub new_role: Role,
    pub changed_by: UserId,
    pub occurred_at: Timestamp,
}

domain_event!(
    MembershipRoleChanged,
    event_type = "membership.role_changed.v1",
    aggregate_id = membership_id,
    aggregate_type = "TenantMembership",
    tenant = tenant_id,
    user = user_id,
    occurred_at = occurred_at,
    event_id = event_id
);
