//! Platform administration, under `/platform`. Every route requires a
//! platform_admin membership in some tenant.
//!
//! - `POST /tenants` - create a tenant (status `trial`)
//! - `PATCH /tenants/:tenant_id/status` - active | trial | suspended
//! - `POST /tenants/:tenant_id/subscription` - link a Stripe subscription

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{patch, post};
use axum::Router;
use serde::Deserialize;

use crate::application::handlers::payment::{LinkSubscriptionCommand, LinkSubscriptionHandler};
use crate::application::handlers::tenancy::{
    CreateTenantCommand, CreateTenantHandler, SetTenantStatusCommand, SetTenantStatusHandler,
};
use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::payment::SubscriptionStatus;
use crate::domain::tenancy::TenantStatus;

use super::error::{created, ok, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", post(create_tenant))
        .route("/tenants/:tenant_id/status", patch(set_status))
        .route("/tenants/:tenant_id/subscription", post(link_subscription))
}

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub slug: String,
    pub name: String,
    pub plan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: TenantStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSubscriptionRequest {
    pub gateway_subscription_id: String,
    pub plan: String,
    #[serde(default = "default_subscription_status")]
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
}

fn default_subscription_status() -> SubscriptionStatus {
    SubscriptionStatus::Active
}

async fn create_tenant(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<CreateTenantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let platform = state.platform(&user).await?;
    let tenant = CreateTenantHandler::new(state.repos.tenants.clone())
        .handle(
            &platform,
            CreateTenantCommand {
                slug: body.slug,
                name: body.name,
                plan: body.plan,
            },
        )
        .await?;
    Ok(created(tenant))
}

async fn set_status(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<SetStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let platform = state.platform(&user).await?;
    let tenant = SetTenantStatusHandler::new(state.repos.tenants.clone())
        .handle(
            &platform,
            SetTenantStatusCommand {
                tenant_id,
                status: body.status,
            },
        )
        .await?;
    Ok(ok(tenant))
}

async fn link_subscription(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<LinkSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let platform = state.platform(&user).await?;
    let subscription = LinkSubscriptionHandler::new(
        state.repos.tenants.clone(),
        state.repos.subscriptions.clone(),
    )
    .handle(
        &platform,
        LinkSubscriptionCommand {
            tenant_id,
            gateway_subscription_id: body.gateway_subscription_id,
            plan: body.plan,
            status: body.status,
            current_period_end: body.current_period_end,
        },
    )
    .await?;
    Ok(created(subscription))
}
