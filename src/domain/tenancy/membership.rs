//! Tenant membership aggregate.
//!
//! A membership binds one user to one tenant with one role. It is the only
//! source of truth for tenant authorization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{MembershipId, TenantId, Timestamp, UserId, ValidationError};

use super::{AccessError, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Invited,
    Removed,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Invited => "invited",
            MembershipStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MembershipStatus::Active),
            "invited" => Ok(MembershipStatus::Invited),
            "removed" => Ok(MembershipStatus::Removed),
            other => Err(ValidationError::invalid_format(
                "membership_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantMembership {
    pub id: MembershipId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub role: Role,
    pub status: MembershipStatus,
    pub invited_by: Option<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TenantMembership {
    /// Membership created on a customer's first interaction with a tenant.
    pub fn customer(tenant_id: TenantId, user_id: UserId, now: Timestamp) -> Self {
        Self {
            id: MembershipId::new(),
            tenant_id,
            user_id,
            role: Role::Customer,
            status: MembershipStatus::Active,
            invited_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending membership for staff or admin, activated on acceptance.
    pub fn invitation(
        tenant_id: TenantId,
        user_id: UserId,
        role: Role,
        invited_by: UserId,
        now: Timestamp,
    ) -> Self {
        Self {
            id: MembershipId::new(),
            tenant_id,
            user_id,
            role,
            status: MembershipStatus::Invited,
            invited_by: Some(invited_by),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    pub fn accept(&mut self, now: Timestamp) -> Result<(), AccessError> {
        if self.status != MembershipStatus::Invited {
            return Err(AccessError::invalid_state(self.status.as_str(), "accept"));
        }
        self.status = MembershipStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// Changes the role, returning the previous one.
    pub fn change_role(&mut self, role: Role, now: Timestamp) -> Result<Role, AccessError> {
        if self.status == MembershipStatus::Removed {
            return Err(AccessError::invalid_state("removed", "change the role of"));
        }
        let previous = self.role;
        self.role = role;
        self.updated_at = now;
        Ok(previous)
    }

    pub fn remove(&mut self, now: Timestamp) -> Result<(), AccessError> {
        if self.status == MembershipStatus::Removed {
            return Err(AccessError::invalid_state("removed", "remove"));
        }
        self.status = MembershipStatus::Removed;
        self.updated_at = now;
        Ok(())
    }

    /// Re-invites a previously removed user in place, keeping the unique
    /// (tenant, user) row.
    pub fn reinvite(&mut self, role: Role, invited_by: UserId, now: Timestamp) -> Result<(), AccessError> {
        if self.status != MembershipStatus::Removed {
            return Err(AccessError::invalid_state(self.status.as_str(), "invite"));
        }
        self.role = role;
        self.status = MembershipStatus::Invited;
        self.invited_by = Some(invited_by);
        self.updated_at = now;
        Ok(())
    }
}
