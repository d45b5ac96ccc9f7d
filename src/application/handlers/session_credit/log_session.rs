//! LogSessionHandler - staff record a delivered session.
//!
//! When a credit is named, its use counter is checked and incremented under
//! the credit's row lock in the same unit of work that inserts the log row.

use serde_json::json;
use std::sync::Arc;

use crate::application::Notifier;
use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{EventId, Timestamp};
use crate::domain::ledger::{
    LedgerError, NewSessionLog, SessionCredit, SessionLog, SessionLogged,
};
use crate::domain::tenancy::TenantContext;
use crate::ports::{Mutation, SessionRepository};

#[derive(Debug, Clone)]
pub struct LogSessionResult {
    pub log: SessionLog,
    pub credit: Option<SessionCredit>,
}

pub struct LogSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    notifier: Notifier,
}

impl LogSessionHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, notifier: Notifier) -> Self {
        Self { sessions, notifier }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        request: NewSessionLog,
    ) -> Result<LogSessionResult, LedgerError> {
        let caller = *ctx;
        let credit_id = request.credit_id;

        let (log, credit) = self
            .sessions
            .log_session(ctx.tenant_id, credit_id, &|credit| {
                let now = Timestamp::now();
                let remaining = match credit {
                    Some(credit) => {
                        credit.consume(request.client_id, now)?;
                        Some(credit.remaining())
                    }
                    None => None,
                };
                let log = SessionLog::record(caller.tenant_id, request.clone(), caller.user_id, now)?;
                let audit = AuditEntry::record(
                    caller.actor(),
                    Some(caller.tenant_id),
                    AuditAction::SessionLogged,
                    "session_log",
                    log.id,
                )
                .with_metadata(json!({
                    "client_id": log.client_id,
                    "coach_id": log.coach_id,
                    "credit_id": log.credit_id,
                    "remaining_sessions": remaining,
                }))
                .at(now);
                Ok(Mutation::audited(log, audit))
            })
            .await?;

        let remaining_sessions = credit.as_ref().map(SessionCredit::remaining);
        tracing::info!(
            tenant_id = %ctx.tenant_id,
            session_log_id = %log.id,
            client_id = %log.client_id,
            remaining = ?remaining_sessions,
            "Session logged"
        );
        self.notifier
            .notify(&SessionLogged {
                event_id: EventId::new(),
                tenant_id: log.tenant_id,
                session_log_id: log.id,
                client_id: log.client_id,
                coach_id: log.coach_id,
                credit_id: log.credit_id,
                remaining_sessions,
                occurred_at: log.created_at,
            })
            .await;

        Ok(LogSessionResult { log, credit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::session_credit::{
        CreatePackageCommand, CreatePackageHandler, GrantCreditCommand, GrantCreditHandler,
    };
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::domain::foundation::UserId;
    use crate::domain::tenancy::{Role, TenantContext};

    async fn credit_for(store: &InMemoryStore, admin: &TenantContext, client: UserId, sessions: u32) -> SessionCredit {
        let package = CreatePackageHandler::new(Arc::new(store.clone()))
            .handle(
                admin,
                CreatePackageCommand {
                    name: "Starter pack".into(),
                    session_count: sessions,
                    price: 30_000,
                    validity_days: Some(90),
                },
            )
            .await
            .unwrap();
        GrantCreditHandler::new(Arc::new(store.clone()))
            .handle(
                admin,
                GrantCreditCommand {
                    package_id: package.id,
                    client_id: client,
                },
            )
            .await
            .unwrap()
    }

    fn session_for(client: UserId, coach: UserId, credit: Option<&SessionCredit>) -> NewSessionLog {
        NewSessionLog {
            client_id: client,
            coach_id: coach,
            credit_id: credit.map(|c| c.id),
            booking_id: None,
            session_date: Timestamp::now(),
            duration_minutes: Some(60),
            notes: None,
        }
    }

    #[tokio::test]
    async fn credit_is_consumed_until_exhausted() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let client = seed_member(&store, tenant, Role::Customer).await;
        let credit = credit_for(&store, &admin, client.user_id, 2).await;
        let handler = LogSessionHandler::new(Arc::new(store.clone()), Notifier::new(Arc::new(bus.clone())));

        for expected_remaining in [1, 0] {
            let result = handler
                .handle(&admin, session_for(client.user_id, admin.user_id, Some(&credit)))
                .await
                .unwrap();
            assert_eq!(result.credit.unwrap().remaining(), expected_remaining);
        }

        let err = handler
            .handle(&admin, session_for(client.user_id, admin.user_id, Some(&credit)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CreditsExhausted));
        assert_eq!(store.session_logs().await.len(), 2);
        assert_eq!(bus.events_of_type("session.logged.v1").len(), 2);
    }

    #[tokio::test]
    async fn credit_of_another_client_is_rejected() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let admin = seed_member(&store, tenant, Role::Admin).await;
        let client = seed_member(&store, tenant, Role::Customer).await;
        let stranger = seed_member(&store, tenant, Role::Customer).await;
        let credit = credit_for(&store, &admin, client.user_id, 5).await;
        let handler = LogSessionHandler::new(
            Arc::new(store.clone()),
            Notifier::new(Arc::new(InMemoryEventBus::new())),
        );

        let err = handler
            .handle(&admin, session_for(stranger.user_id, admin.user_id, Some(&credit)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        let stored = store.find_credit(tenant, credit.id).await.unwrap().unwrap();
        assert_eq!(stored.used_sessions, 0);
    }

    #[tokio::test]
    async fn session_without_credit_is_logged() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let client = seed_member(&store, tenant, Role::Customer).await;

        let result = LogSessionHandler::new(
            Arc::new(store.clone()),
            Notifier::new(Arc::new(InMemoryEventBus::new())),
        )
        .handle(&staff, session_for(client.user_id, staff.user_id, None))
        .await
        .unwrap();
        assert!(result.credit.is_none());
        assert_eq!(result.log.logged_by, staff.user_id);
    }

    #[tokio::test]
    async fn granting_from_unknown_package_is_not_found() {
        let store = InMemoryStore::new();
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let err = GrantCreditHandler::new(Arc::new(store))
            .handle(
                &staff,
                GrantCreditCommand {
                    package_id: crate::domain::foundation::SessionPackageId::new(),
                    client_id: UserId::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
