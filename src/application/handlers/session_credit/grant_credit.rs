//! GrantCreditHandler - staff grant a client the sessions of a package.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{SessionPackageId, Timestamp, UserId};
use crate::domain::ledger::{LedgerError, SessionCredit};
use crate::domain::tenancy::TenantContext;
use crate::ports::SessionRepository;

#[derive(Debug, Clone)]
pub struct GrantCreditCommand {
    pub package_id: SessionPackageId,
    pub client_id: UserId,
}

pub struct GrantCreditHandler {
    sessions: Arc<dyn SessionRepository>,
}

impl GrantCreditHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: GrantCreditCommand,
    ) -> Result<SessionCredit, LedgerError> {
        let package = self
            .sessions
            .find_package(ctx.tenant_id, cmd.package_id)
            .await?
            .ok_or(LedgerError::not_found("session package"))?;

        let now = Timestamp::now();
        let credit = SessionCredit::grant(&package, cmd.client_id, now)?;
        let audit = AuditEntry::record(
            ctx.actor(),
            Some(ctx.tenant_id),
            AuditAction::SessionCreditGranted,
            "session_credit",
            credit.id,
        )
        .with_metadata(json!({
            "package_id": package.id,
            "client_id": cmd.client_id,
            "total_sessions": credit.total_sessions,
        }))
        .at(now);

        self.sessions.grant_credit(&credit, &audit).await?;
        tracing::info!(
            tenant_id = %ctx.tenant_id,
            credit_id = %credit.id,
            client_id = %cmd.client_id,
            sessions = credit.total_sessions,
            "Session credit granted"
        );
        Ok(credit)
    }
}
