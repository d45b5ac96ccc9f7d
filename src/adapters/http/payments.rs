//! Payment endpoints, nested under `/tenants/:tenant_id/payments`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Deserialize;

use crate::application::handlers::payment::{
    GetPaymentHandler, RecordPaymentCommand, RecordPaymentHandler, UpdatePaymentStatusCommand,
    UpdatePaymentStatusHandler,
};
use crate::domain::foundation::{OrderId, PaymentId, TenantId, UserId};
use crate::domain::payment::{Gateway, PaymentStatus};
use crate::domain::tenancy::Role;

use super::error::{created, ok, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(record))
        .route("/:payment_id", get(show))
        .route("/:payment_id/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub amount: i64,
    pub currency: Option<String>,
    pub gateway: Gateway,
    /// The correlation id later webhooks carry.
    pub gateway_reference: Option<String>,
    pub customer_id: Option<UserId>,
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
}

async fn record(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let payment = RecordPaymentHandler::new(state.repos.payments.clone())
        .handle(
            &ctx,
            RecordPaymentCommand {
                amount: body.amount,
                currency: body.currency,
                gateway: body.gateway,
                gateway_reference: body.gateway_reference,
                customer_id: body.customer_id,
                order_id: body.order_id,
            },
        )
        .await?;
    Ok(created(payment))
}

/// Staff see every payment; a customer sees only their own.
async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, payment_id)): Path<(TenantId, PaymentId)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Customer).await?;
    let payment = GetPaymentHandler::new(state.repos.payments.clone())
        .handle(&ctx, payment_id)
        .await?;
    Ok(ok(payment))
}

async fn update_status(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, payment_id)): Path<(TenantId, PaymentId)>,
    ApiJson(body): ApiJson<UpdatePaymentStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let payment =
        UpdatePaymentStatusHandler::new(state.repos.payments.clone(), state.notifier.clone())
            .handle(
                &ctx,
                UpdatePaymentStatusCommand {
                    payment_id,
                    status: body.status,
                },
            )
            .await?;
    Ok(ok(payment))
}
