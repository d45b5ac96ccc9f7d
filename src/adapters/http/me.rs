//! The caller's own profile and memberships.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::application::handlers::tenancy::ListMyMembershipsHandler;

use super::error::{ok, ApiError};
use super::middleware::RequireUser;
use super::realtime;
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(me))
        .route("/events", get(realtime::user_events))
}

async fn me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, ApiError> {
    let view = ListMyMembershipsHandler::new(state.repos.memberships.clone())
        .handle(user)
        .await?;
    Ok(ok(view))
}
