//! Gift card endpoints, nested under `/tenants/:tenant_id/gift-cards`.
//!
//! - `POST /` (staff) - issue
//! - `GET /:code` (staff) - card with its transaction history
//! - `POST /:code/redeem` (staff)
//! - `POST /:code/topup` (staff)
//! - `POST /:code/cancel` (admin)
//! - `POST /:code/reactivate` (admin)
//! - `DELETE /:code` (admin) - cancelled cards only

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::application::handlers::gift_card::{
    ChangeGiftCardStatusHandler, DeleteGiftCardHandler, GetGiftCardHandler, GiftCardStatusChange,
    IssueGiftCardCommand, IssueGiftCardHandler, RedeemGiftCardCommand, RedeemGiftCardHandler,
    TopUpGiftCardCommand, TopUpGiftCardHandler,
};
use crate::domain::foundation::{GiftCardId, GiftCardTransactionId, Money, TenantId, Timestamp, UserId};
use crate::domain::ledger::GiftCardStatus;
use crate::domain::tenancy::Role;

use super::error::{created, ok, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(issue))
        .route("/:code", get(show).delete(delete))
        .route("/:code/redeem", post(redeem))
        .route("/:code/topup", post(top_up))
        .route("/:code/cancel", post(cancel))
        .route("/:code/reactivate", post(reactivate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueGiftCardRequest {
    pub initial_balance: i64,
    pub currency: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
    pub purchased_by: Option<UserId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedGiftCardResponse {
    pub card_id: GiftCardId,
    pub code: String,
    pub current_balance: Money,
    pub status: GiftCardStatus,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    pub amount: i64,
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemedResponse {
    pub remaining_balance: Money,
    pub status: GiftCardStatus,
    pub transaction_id: GiftCardTransactionId,
}

async fn issue(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<IssueGiftCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let card = IssueGiftCardHandler::new(state.repos.gift_cards.clone(), state.notifier.clone())
        .handle(
            &ctx,
            IssueGiftCardCommand {
                initial_balance: body.initial_balance,
                currency: body.currency,
                expires_at: body.expires_at,
                recipient_name: body.recipient_name,
                recipient_email: body.recipient_email,
                message: body.message,
                purchased_by: body.purchased_by,
            },
        )
        .await?;

    Ok(created(IssuedGiftCardResponse {
        card_id: card.id,
        code: card.code.to_string(),
        current_balance: card.current_balance,
        status: card.status,
        expires_at: card.expires_at,
    }))
}

async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, code)): Path<(TenantId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let view = GetGiftCardHandler::new(state.repos.gift_cards.clone())
        .handle(&ctx, &code)
        .await?;
    Ok(ok(view))
}

async fn redeem(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, code)): Path<(TenantId, String)>,
    ApiJson(body): ApiJson<AmountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let result = RedeemGiftCardHandler::new(state.repos.gift_cards.clone(), state.notifier.clone())
        .handle(
            &ctx,
            RedeemGiftCardCommand {
                code,
                amount: body.amount,
                reference: body.reference,
            },
        )
        .await?;

    Ok(ok(RedeemedResponse {
        remaining_balance: result.card.current_balance,
        status: result.card.status,
        transaction_id: result.transaction.id,
    }))
}

async fn top_up(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, code)): Path<(TenantId, String)>,
    ApiJson(body): ApiJson<AmountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let card = TopUpGiftCardHandler::new(state.repos.gift_cards.clone())
        .handle(
            &ctx,
            TopUpGiftCardCommand {
                code,
                amount: body.amount,
            },
        )
        .await?;
    Ok(ok(card))
}

async fn cancel(
    state: State<AppState>,
    user: RequireUser,
    path: Path<(TenantId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    change_status(state, user, path, GiftCardStatusChange::Cancel).await
}

async fn reactivate(
    state: State<AppState>,
    user: RequireUser,
    path: Path<(TenantId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    change_status(state, user, path, GiftCardStatusChange::Reactivate).await
}

async fn change_status(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, code)): Path<(TenantId, String)>,
    change: GiftCardStatusChange,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let card = ChangeGiftCardStatusHandler::new(state.repos.gift_cards.clone())
        .handle(&ctx, &code, change)
        .await?;
    Ok(ok(card))
}

async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, code)): Path<(TenantId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Admin).await?;
    let card = DeleteGiftCardHandler::new(state.repos.gift_cards.clone())
        .handle(&ctx, &code)
        .await?;
    Ok(ok(serde_json::json!({ "deleted": true, "cardId": card.id })))
}
