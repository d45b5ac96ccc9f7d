//! Point-of-sale endpoints, nested under `/tenants/:tenant_id/pos`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Deserialize;

use crate::application::handlers::pos::{
    CreatePosTransactionHandler, GetPosTransactionHandler, VoidPosTransactionCommand,
    VoidPosTransactionHandler,
};
use crate::domain::foundation::{Money, PosTransactionId, TenantId, UserId};
use crate::domain::ledger::{NewPosTransaction, PaymentMethod, PosLineItem};
use crate::domain::tenancy::Role;

use super::error::{created, ok, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:tx_id", get(show))
        .route("/:tx_id/void", patch(void))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePosTransactionRequest {
    pub customer_id: Option<UserId>,
    pub items: Vec<PosLineItem>,
    #[serde(default)]
    pub discount: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoidRequest {
    pub reason: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<CreatePosTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let transaction =
        CreatePosTransactionHandler::new(state.repos.pos.clone(), state.notifier.clone())
            .handle(
                &ctx,
                NewPosTransaction {
                    customer_id: body.customer_id,
                    items: body.items,
                    discount: Money::from_cents(body.discount),
                    payment_method: body.payment_method,
                    notes: body.notes,
                },
            )
            .await?;
    Ok(created(transaction))
}

async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, tx_id)): Path<(TenantId, PosTransactionId)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let transaction = GetPosTransactionHandler::new(state.repos.pos.clone())
        .handle(&ctx, tx_id)
        .await?;
    Ok(ok(transaction))
}

/// The body is optional; `{"reason": "..."}` is recorded when given.
async fn void(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, tx_id)): Path<(TenantId, PosTransactionId)>,
    body: Option<ApiJson<VoidRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let ApiJson(body) = body.unwrap_or(ApiJson(VoidRequest::default()));
    let transaction = VoidPosTransactionHandler::new(state.repos.pos.clone(), state.notifier.clone())
        .handle(
            &ctx,
            VoidPosTransactionCommand {
                transaction_id: tx_id,
                reason: body.reason,
            },
        )
        .await?;
    Ok(ok(transaction))
}
