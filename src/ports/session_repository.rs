//! Session package, credit and log repository port.

use async_trait::async_trait;

use crate::domain::audit::AuditEntry;
use crate::domain::foundation::{SessionCreditId, SessionPackageId, TenantId, UserId};
use crate::domain::ledger::{LedgerError, SessionCredit, SessionLog, SessionPackage};

use super::Mutation;

/// Builds the session log, consuming the locked credit when one was named.
pub type LogSessionFn<'a> = dyn Fn(Option<&mut SessionCredit>) -> Result<Mutation<SessionLog>, LedgerError>
    + Send
    + Sync
    + 'a;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_package(
        &self,
        package: &SessionPackage,
        audit: &AuditEntry,
    ) -> Result<(), LedgerError>;

    async fn find_package(
        &self,
        tenant_id: TenantId,
        id: SessionPackageId,
    ) -> Result<Option<SessionPackage>, LedgerError>;

    async fn grant_credit(&self, credit: &SessionCredit, audit: &AuditEntry) -> Result<(), LedgerError>;

    async fn find_credit(
        &self,
        tenant_id: TenantId,
        id: SessionCreditId,
    ) -> Result<Option<SessionCredit>, LedgerError>;

    async fn credits_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Vec<SessionCredit>, LedgerError>;

    async fn logs_for_credit(
        &self,
        tenant_id: TenantId,
        credit_id: SessionCreditId,
    ) -> Result<Vec<SessionLog>, LedgerError>;

    /// Records a session. When `credit_id` is set the credit is locked
    /// first and fails `NotFound` if absent; `build` then sees it. The
    /// credit update, log row and audit entry commit together.
    async fn log_session(
        &self,
        tenant_id: TenantId,
        credit_id: Option<SessionCreditId>,
        build: &LogSessionFn<'_>,
    ) -> Result<(SessionLog, Option<SessionCredit>), LedgerError>;
}
