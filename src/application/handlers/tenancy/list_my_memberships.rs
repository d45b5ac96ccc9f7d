//! ListMyMembershipsHandler - backs `GET /me`.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::DomainError;
use crate::domain::tenancy::{TenantMembership, User};
use crate::ports::MembershipRepository;

#[derive(Debug, Clone, Serialize)]
pub struct MeView {
    pub user: User,
    pub memberships: Vec<TenantMembership>,
}

pub struct ListMyMembershipsHandler {
    memberships: Arc<dyn MembershipRepository>,
}

impl ListMyMembershipsHandler {
    pub fn new(memberships: Arc<dyn MembershipRepository>) -> Self {
        Self { memberships }
    }

    /// Returns the user with every non-removed membership.
    pub async fn handle(&self, user: User) -> Result<MeView, DomainError> {
        let memberships = self.memberships.list_for_user(user.id).await?;
        Ok(MeView { user, memberships })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::seed_tenant;
    use crate::domain::foundation::{AuthenticatedUser, Timestamp};
    use crate::ports::UserRepository;

    #[tokio::test]
    async fn lists_memberships_across_tenants() {
        let store = InMemoryStore::new();
        let user = store
            .upsert_by_subject(&AuthenticatedUser::new("sub-me", "me@example.com", None, true))
            .await
            .unwrap();
        for _ in 0..2 {
            let tenant = seed_tenant(&store).await;
            store
                .put_membership(TenantMembership::customer(tenant, user.id, Timestamp::now()))
                .await;
        }

        let view = ListMyMembershipsHandler::new(Arc::new(store))
            .handle(user.clone())
            .await
            .unwrap();
        assert_eq!(view.user.id, user.id);
        assert_eq!(view.memberships.len(), 2);
    }
}
