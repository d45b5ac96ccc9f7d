//! `GET /tenants/:tenant_id/audit-logs?limit=&before=` (admin).

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::application::handlers::audit_log::{ListAuditLogHandler, ListAuditLogQuery};
use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::tenancy::Role;

use super::error::{ok, ApiError};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list))
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogParams {
    pub limit: Option<u32>,
    pub before: Option<Timestamp>,
}

async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    Query(params): Query<AuditLogParams>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let entries = ListAuditLogHandler::new(state.repos.audit_log.clone())
        .handle(
            &ctx,
            ListAuditLogQuery {
                limit: params.limit,
                before: params.before,
            },
        )
        .await?;
    Ok(ok(entries))
}
