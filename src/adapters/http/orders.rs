//! Order endpoints, nested under `/tenants/:tenant_id/orders`.
//!
//! Customers may create and read their own orders; the handlers enforce
//! the ownership rule. Status changes are staff-only.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Deserialize;

use crate::application::handlers::order::{
    CreateOrderCommand, CreateOrderHandler, GetOrderHandler, UpdateOrderStatusCommand,
    UpdateOrderStatusHandler,
};
use crate::domain::foundation::{OrderId, TenantId, UserId};
use crate::domain::ledger::{OrderLineRequest, OrderStatus};
use crate::domain::tenancy::Role;

use super::error::{created, ok, ApiError, ApiJson};
use super::middleware::RequireUser;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:order_id", get(show))
        .route("/:order_id/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Staff may order on behalf of a customer.
    pub customer_id: Option<UserId>,
    pub items: Vec<OrderLineRequest>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Customer).await?;
    let order = CreateOrderHandler::new(
        state.repos.orders.clone(),
        state.repos.catalog.clone(),
        state.notifier.clone(),
    )
    .handle(
        &ctx,
        CreateOrderCommand {
            customer_id: body.customer_id,
            items: body.items,
            currency: body.currency,
            notes: body.notes,
        },
    )
    .await?;
    Ok(created(order))
}

async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, order_id)): Path<(TenantId, OrderId)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Customer).await?;
    let order = GetOrderHandler::new(state.repos.orders.clone())
        .handle(&ctx, order_id)
        .await?;
    Ok(ok(order))
}

async fn update_status(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((tenant_id, order_id)): Path<(TenantId, OrderId)>,
    ApiJson(body): ApiJson<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    let order = UpdateOrderStatusHandler::new(state.repos.orders.clone(), state.notifier.clone())
        .handle(
            &ctx,
            UpdateOrderStatusCommand {
                order_id,
                status: body.status,
            },
        )
        .await?;
    Ok(ok(order))
}
