//! Access and membership error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Unauthenticated | 401 |
//! | NoTenantAccess | 403 |
//! | InsufficientRole | 403 |
//! | NotPlatformAdmin | 403 |
//! | CannotGrantRole | 403 |
//! | TenantNotFound / UserNotFound / MembershipNotFound | 404 |
//! | InvalidMembershipState / Conflict | 422 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ErrorKind, TenantId, UserId};

use super::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No session, or the session did not resolve to a user.
    Unauthenticated,

    /// The caller has no active membership in the tenant.
    NoTenantAccess { tenant_id: TenantId },

    /// The caller's role ranks below the required minimum.
    InsufficientRole { required: Role, actual: Role },

    /// The caller holds no platform_admin membership anywhere.
    NotPlatformAdmin,

    /// The caller tried to grant a role above their own.
    CannotGrantRole { role: Role },

    TenantNotFound(TenantId),

    UserNotFound(UserId),

    MembershipNotFound { tenant_id: TenantId, user_id: UserId },

    InvalidMembershipState { current: String, attempted: String },

    /// A unique key (tenant slug, membership pair) is already taken.
    Conflict(String),

    ValidationFailed { field: String, message: String },

    Infrastructure(String),
}

impl AccessError {
    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        AccessError::InvalidMembershipState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AccessError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        AccessError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AccessError::Unauthenticated => ErrorCode::Unauthorized,
            AccessError::NoTenantAccess { .. } => ErrorCode::NoTenantAccess,
            AccessError::InsufficientRole { .. } | AccessError::CannotGrantRole { .. } => {
                ErrorCode::InsufficientRole
            }
            AccessError::NotPlatformAdmin => ErrorCode::NotPlatformAdmin,
            AccessError::TenantNotFound(_) => ErrorCode::TenantNotFound,
            AccessError::UserNotFound(_) => ErrorCode::UserNotFound,
            AccessError::MembershipNotFound { .. } => ErrorCode::MembershipNotFound,
            AccessError::InvalidMembershipState { .. } => ErrorCode::InvalidStateTransition,
            AccessError::Conflict(_) => ErrorCode::Conflict,
            AccessError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            AccessError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    /// Returns a caller-safe error message.
    pub fn message(&self) -> String {
        match self {
            AccessError::Unauthenticated => "Authentication required".to_string(),
            AccessError::NoTenantAccess { .. } => {
                "You do not have access to this tenant".to_string()
            }
            AccessError::InsufficientRole { required, .. } => {
                format!("This action requires the {} role or higher", required)
            }
            AccessError::NotPlatformAdmin => "Platform administrator access required".to_string(),
            AccessError::CannotGrantRole { role } => {
                format!("You cannot grant the {} role", role)
            }
            AccessError::TenantNotFound(_) => "Tenant not found".to_string(),
            AccessError::UserNotFound(_) => "User not found".to_string(),
            AccessError::MembershipNotFound { .. } => "Membership not found".to_string(),
            AccessError::InvalidMembershipState { current, attempted } => {
                format!("Cannot {} a membership that is {}", attempted, current)
            }
            AccessError::Conflict(what) => format!("Conflict: {}", what),
            AccessError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            AccessError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AccessError {}

impl From<DomainError> for AccessError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => AccessError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::Conflict => AccessError::Conflict(err.message),
            _ => AccessError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_failures_are_forbidden() {
        let err = AccessError::NoTenantAccess {
            tenant_id: TenantId::new(),
        };
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(
            AccessError::InsufficientRole {
                required: Role::Admin,
                actual: Role::Staff
            }
            .kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(AccessError::NotPlatformAdmin.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn unauthenticated_is_unauthorized() {
        assert_eq!(AccessError::Unauthenticated.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn insufficient_role_message_names_requirement() {
        let err = AccessError::InsufficientRole {
            required: Role::Admin,
            actual: Role::Staff,
        };
        assert_eq!(err.message(), "This action requires the admin role or higher");
    }

    #[test]
    fn domain_errors_become_infrastructure() {
        let err: AccessError = DomainError::database("connection reset").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
