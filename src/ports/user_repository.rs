//! User repository port.

use async_trait::async_trait;

use crate::domain::foundation::{AuthenticatedUser, DomainError, UserId};
use crate::domain::tenancy::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the user for an identity-provider subject, creating the row on
    /// first sight. Profile fields are refreshed on later calls; the internal
    /// id never changes.
    async fn upsert_by_subject(&self, identity: &AuthenticatedUser) -> Result<User, DomainError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError>;
}
