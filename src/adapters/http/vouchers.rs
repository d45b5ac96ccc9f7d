//! Voucher endpoints, nested under `/tenants/:tenant_id/vouchers`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::application::handlers::voucher::{
    CreateVoucherHandler, DeactivateVoucherHandler, RedeemVoucherCommand, RedeemVoucherHandler,
};
use crate::domain::foundation::{TenantId, Timestamp, VoucherId};
use crate::domain::ledger::{NewVoucher, VoucherType};
use crate::domain::tenancy::Role;

use super::error::{created, ok, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:voucher_id/deactivate", post(deactivate))
        .route("/:voucher_id/redeem", post(redeem))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoucherRequest {
    pub code: String,
    #[serde(rename = "type")]
    pub voucher_type: VoucherType,
    pub value: i64,
    pub max_uses: Option<u32>,
    pub expires_at: Option<Timestamp>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemVoucherRequest {
    pub order_amount: i64,
}

async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<CreateVoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let voucher = CreateVoucherHandler::new(state.repos.vouchers.clone())
        .handle(
            &ctx,
            NewVoucher {
                code: body.code,
                voucher_type: body.voucher_type,
                value: body.value,
                max_uses: body.max_uses,
                expires_at: body.expires_at,
                description: body.description,
            },
        )
        .await?;
    Ok(created(voucher))
}

async fn deactivate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, voucher_id)): Path<(TenantId, VoucherId)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let voucher = DeactivateVoucherHandler::new(state.repos.vouchers.clone())
        .handle(&ctx, voucher_id)
        .await?;
    Ok(ok(voucher))
}

/// Any active member may redeem; the redemption is recorded against them.
async fn redeem(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, voucher_id)): Path<(TenantId, VoucherId)>,
    ApiJson(body): ApiJson<RedeemVoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Customer).await?;
    let result = RedeemVoucherHandler::new(state.repos.vouchers.clone(), state.notifier.clone())
        .handle(
            &ctx,
            RedeemVoucherCommand {
                voucher_id,
                order_amount: body.order_amount,
            },
        )
        .await?;
    Ok(ok(result))
}
