//! Membership endpoints under `/tenants/:tenant_id`.
//!
//! `join` and `invitations/accept` run before the caller holds an active
//! membership, so they skip the access gate. Everything else is admin-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, patch, post};
use axum::Router;
use serde::Deserialize;

use crate::application::handlers::tenancy::{
    AcceptInvitationHandler, ChangeMemberRoleCommand, ChangeMemberRoleHandler,
    InviteMemberCommand, InviteMemberHandler, JoinTenantHandler, RemoveMemberHandler,
};
use crate::domain::foundation::{TenantId, UserId};
use crate::domain::tenancy::Role;

use super::error::{created, ok, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/join", post(join))
        .route("/invitations/accept", post(accept_invitation))
        .route("/members", post(invite))
        .route("/members/:user_id", delete(remove))
        .route("/members/:user_id/role", patch(change_role))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteMemberRequest {
    pub user_id: UserId,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// Idempotent: 201 on first join, 200 with the existing membership after.
async fn join(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = JoinTenantHandler::new(state.repos.tenants.clone(), state.repos.memberships.clone())
        .handle(user.id, tenant_id)
        .await?;
    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, ok(result.membership)))
}

async fn accept_invitation(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
) -> Result<impl IntoResponse, ApiError> {
    let membership = AcceptInvitationHandler::new(state.repos.memberships.clone())
        .handle(user.id, tenant_id)
        .await?;
    Ok(ok(membership))
}

async fn invite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<InviteMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let membership = InviteMemberHandler::new(state.repos.users.clone(), state.repos.memberships.clone())
        .handle(
            &ctx,
            InviteMemberCommand {
                user_id: body.user_id,
                role: body.role,
            },
        )
        .await?;
    Ok(created(membership))
}

async fn change_role(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, member_id)): Path<(TenantId, UserId)>,
    ApiJson(body): ApiJson<ChangeRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let membership = ChangeMemberRoleHandler::new(
        state.repos.memberships.clone(),
        state.repos.users.clone(),
        state.mirror.clone(),
        state.notifier.clone(),
    )
    .handle(
        &ctx,
        ChangeMemberRoleCommand {
            user_id: member_id,
            role: body.role,
        },
    )
    .await?;
    Ok(ok(membership))
}

async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, member_id)): Path<(TenantId, UserId)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let membership = RemoveMemberHandler::new(state.repos.memberships.clone())
        .handle(&ctx, member_id)
        .await?;
    Ok(ok(membership))
}
