//! Role hierarchy.
//!
//! Roles are a closed, totally ordered set. Hierarchy checks compare ranks,
//! never role names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

use super::AccessError;

/// A caller's role within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    Admin,
    PlatformAdmin,
}

impl Role {
    /// Numeric rank: platform_admin(4) > admin(3) > staff(2) > customer(1).
    pub fn rank(&self) -> u8 {
        match self {
            Role::Customer => 1,
            Role::Staff => 2,
            Role::Admin => 3,
            Role::PlatformAdmin => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::PlatformAdmin => "platform_admin",
        }
    }

    /// True if this role outranks or equals `other`.
    pub fn at_least(&self, other: Role) -> bool {
        self.rank() >= other.rank()
    }

    /// The lowest-ranked role in `allowed`, if any.
    pub fn minimum_of(allowed: &[Role]) -> Option<Role> {
        allowed.iter().copied().min_by_key(Role::rank)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "platform_admin" => Ok(Role::PlatformAdmin),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Rejects `actual` unless it ranks at least as high as the weakest role in
/// `allowed`. An empty set imposes no requirement beyond membership.
pub fn require_role(actual: Role, allowed: &[Role]) -> Result<(), AccessError> {
    match Role::minimum_of(allowed) {
        Some(required) if !actual.at_least(required) => {
            Err(AccessError::InsufficientRole { required, actual })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_strictly_ordered() {
        assert!(Role::PlatformAdmin.rank() > Role::Admin.rank());
        assert!(Role::Admin.rank() > Role::Staff.rank());
        assert!(Role::Staff.rank() > Role::Customer.rank());
        assert_eq!(Role::Customer.rank(), 1);
        assert_eq!(Role::PlatformAdmin.rank(), 4);
    }

    #[test]
    fn minimum_of_picks_lowest_rank() {
        assert_eq!(Role::minimum_of(&[Role::Admin, Role::Staff]), Some(Role::Staff));
        assert_eq!(Role::minimum_of(&[]), None);
    }

    #[test]
    fn require_role_allows_higher_ranks() {
        assert!(require_role(Role::Admin, &[Role::Staff]).is_ok());
        assert!(require_role(Role::Staff, &[Role::Staff]).is_ok());
        assert!(require_role(Role::PlatformAdmin, &[Role::Admin]).is_ok());
    }

    #[test]
    fn require_role_uses_weakest_allowed_role() {
        assert!(require_role(Role::Staff, &[Role::Admin, Role::Staff]).is_ok());
    }

    #[test]
    fn require_role_rejects_lower_ranks() {
        let err = require_role(Role::Customer, &[Role::Staff]).unwrap_err();
        assert_eq!(
            err,
            AccessError::InsufficientRole {
                required: Role::Staff,
                actual: Role::Customer
            }
        );
    }

    #[test]
    fn empty_requirement_passes_any_member() {
        assert!(require_role(Role::Customer, &[]).is_ok());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::PlatformAdmin).unwrap(), "\"platform_admin\"");
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert!("owner".parse::<Role>().is_err());
    }
}
