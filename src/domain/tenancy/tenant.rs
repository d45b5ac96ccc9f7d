//! Tenants and users.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    AuthenticatedUser, TenantId, Timestamp, UserId, ValidationError,
};

/// URL-safe tenant handle: 3 to 63 lowercase alphanumerics or hyphens,
/// not starting or ending with a hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantSlug(String);

impl TenantSlug {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let len = value.len() as i64;
        if !(3..=63).contains(&len) {
            return Err(ValidationError::out_of_range("slug", 3, 63, len));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "slug",
                "only lowercase letters, digits and hyphens are allowed",
            ));
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(ValidationError::invalid_format(
                "slug",
                "cannot start or end with a hyphen",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantSlug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TenantSlug::new(value)
    }
}

impl From<TenantSlug> for String {
    fn from(slug: TenantSlug) -> Self {
        slug.0
    }
}

impl fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Trial,
    Suspended,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Trial => "trial",
            TenantStatus::Suspended => "suspended",
        }
    }

    /// Suspended tenants are closed to every member.
    pub fn allows_access(&self) -> bool {
        !matches!(self, TenantStatus::Suspended)
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TenantStatus::Active),
            "trial" => Ok(TenantStatus::Trial),
            "suspended" => Ok(TenantStatus::Suspended),
            other => Err(ValidationError::invalid_format(
                "tenant_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub slug: TenantSlug,
    pub name: String,
    pub plan: String,
    pub status: TenantStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tenant {
    pub fn create(
        slug: TenantSlug,
        name: impl Into<String>,
        plan: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        Ok(Self {
            id: TenantId::new(),
            slug,
            name,
            plan: plan.into(),
            status: TenantStatus::Trial,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Internal user record, created the first time a session subject is seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub auth_subject: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn first_seen(identity: &AuthenticatedUser, now: Timestamp) -> Self {
        Self {
            id: UserId::new(),
            auth_subject: identity.subject.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes profile claims. The id and subject never change.
    pub fn refresh_profile(&mut self, identity: &AuthenticatedUser, now: Timestamp) -> bool {
        let changed = self.email != identity.email || self.display_name != identity.display_name;
        if changed {
            self.email = identity.email.clone();
            self.display_name = identity.display_name.clone();
            self.updated_at = now;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_accepts_url_safe_values() {
        assert!(TenantSlug::new("acme-fitness-2").is_ok());
    }

    #[test]
    fn slug_rejects_invalid_values() {
        assert!(TenantSlug::new("ab").is_err());
        assert!(TenantSlug::new("Acme").is_err());
        assert!(TenantSlug::new("acme_fit").is_err());
        assert!(TenantSlug::new("-acme").is_err());
        assert!(TenantSlug::new("acme-").is_err());
    }

    #[test]
    fn new_tenant_starts_in_trial() {
        let tenant = Tenant::create(
            TenantSlug::new("acme").unwrap(),
            "Acme",
            "starter",
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(tenant.status, TenantStatus::Trial);
        assert!(tenant.status.allows_access());
    }

    #[test]
    fn suspended_tenant_denies_access() {
        assert!(!TenantStatus::Suspended.allows_access());
    }

    #[test]
    fn refresh_profile_keeps_identity() {
        let identity = AuthenticatedUser::new("sub-1", "old@example.com", None, true);
        let mut user = User::first_seen(&identity, Timestamp::now());
        let id = user.id;

        let updated = AuthenticatedUser::new("sub-1", "new@example.com", Some("New".into()), true);
        assert!(user.refresh_profile(&updated, Timestamp::now()));
        assert_eq!(user.id, id);
        assert_eq!(user.email, "new@example.com");
        assert!(!user.refresh_profile(&updated, Timestamp::now()));
    }
}
