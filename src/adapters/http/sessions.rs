//! Session package, credit and log endpoints, nested under
//! `/tenants/:tenant_id/sessions`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::application::handlers::session_credit::{
    CreatePackageCommand, CreatePackageHandler, GrantCreditCommand, GrantCreditHandler,
    LogSessionHandler,
};
use crate::domain::foundation::{
    BookingId, SessionCreditId, SessionLogId, SessionPackageId, TenantId, Timestamp, UserId,
};
use crate::domain::ledger::NewSessionLog;
use crate::domain::tenancy::Role;

use super::error::{created, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/packages", post(create_package))
        .route("/credits", post(grant_credit))
        .route("/logs", post(log_session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    pub name: String,
    pub session_count: u32,
    pub price: i64,
    pub validity_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantCreditRequest {
    pub package_id: SessionPackageId,
    pub client_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSessionRequest {
    pub client_id: UserId,
    /// Defaults to the caller.
    pub coach_id: Option<UserId>,
    pub credit_id: Option<SessionCreditId>,
    pub booking_id: Option<BookingId>,
    /// Defaults to now.
    pub session_date: Option<Timestamp>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedSessionResponse {
    pub log_id: SessionLogId,
    pub credit_id: Option<SessionCreditId>,
    pub sessions_remaining: Option<u32>,
}

async fn create_package(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<CreatePackageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let package = CreatePackageHandler::new(state.repos.sessions.clone())
        .handle(
            &ctx,
            CreatePackageCommand {
                name: body.name,
                session_count: body.session_count,
                price: body.price,
                validity_days: body.validity_days,
            },
        )
        .await?;
    Ok(created(package))
}

async fn grant_credit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<GrantCreditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let credit = GrantCreditHandler::new(state.repos.sessions.clone())
        .handle(
            &ctx,
            GrantCreditCommand {
                package_id: body.package_id,
                client_id: body.client_id,
            },
        )
        .await?;
    Ok(created(credit))
}

async fn log_session(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<LogSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let result = LogSessionHandler::new(state.repos.sessions.clone(), state.notifier.clone())
        .handle(
            &ctx,
            NewSessionLog {
                client_id: body.client_id,
                coach_id: body.coach_id.unwrap_or(ctx.user_id),
                credit_id: body.credit_id,
                booking_id: body.booking_id,
                session_date: body.session_date.unwrap_or_else(Timestamp::now),
                duration_minutes: body.duration_minutes,
                notes: body.notes,
            },
        )
        .await?;

    Ok(created(LoggedSessionResponse {
        log_id: result.log.id,
        credit_id: result.log.credit_id,
        sessions_remaining: result.credit.as_ref().map(|c| c.remaining()),
    }))
}
