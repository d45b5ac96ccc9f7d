//! CreatePackageHandler - admin defines a session package.

use serde_json::json;
use std::sync::Arc;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::foundation::{Money, Timestamp};
use crate::domain::ledger::{LedgerError, SessionPackage};
use crate::domain::tenancy::TenantContext;
use crate::ports::SessionRepository;

#[derive(Debug, Clone)]
pub struct CreatePackageCommand {
    pub name: String,
    pub session_count: u32,
    pub price: i64,
    pub validity_days: Option<u32>,
}

pub struct CreatePackageHandler {
    sessions: Arc<dyn SessionRepository>,
}

impl CreatePackageHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        cmd: CreatePackageCommand,
    ) -> Result<SessionPackage, LedgerError> {
        let now = Timestamp::now();
        let package = SessionPackage::create(
            ctx.tenant_id,
            cmd.name,
            cmd.session_count,
            Money::from_cents(cmd.price),
            cmd.validity_days,
            now,
        )?;
        let audit = AuditEntry::record(
            ctx.actor(),
            Some(ctx.tenant_id),
            AuditAction::SessionPackageCreated,
            "session_package",
            package.id,
        )
        .with_metadata(json!({
            "name": package.name,
            "session_count": package.session_count,
            "price": package.price,
        }))
        .at(now);

        self.sessions.create_package(&package, &audit).await?;
        tracing::info!(tenant_id = %ctx.tenant_id, package_id = %package.id, "Session package created");
        Ok(package)
    }
}
