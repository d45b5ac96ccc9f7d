//! WebSocket feeds of published domain events.
//!
//! - `GET /tenants/:tenant_id/events` (staff) - every event of the tenant
//! - `GET /me/events` - events addressed to the caller
//!
//! Browsers cannot set an Authorization header on an upgrade request, so
//! the auth middleware also accepts `?access_token=` here. Access is
//! checked once, before the upgrade. The feed is one-way: client text
//! frames are ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::adapters::events::Room;
use crate::domain::foundation::{EventEnvelope, TenantId};
use crate::domain::tenancy::Role;

use super::error::ApiError;
use super::middleware::RequireUser;
use super::state::AppState;

pub async fn tenant_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
) -> Result<Response, ApiError> {
    let ctx = state.tenant(&user, tenant_id, Role::Staff).await?;
    tracing::debug!(tenant_id = %ctx.tenant_id, user_id = %ctx.user_id, "Tenant feed opened");
    Ok(ws.on_upgrade(move |socket| stream_room(socket, state, Room::Tenant(tenant_id))))
}

pub async fn user_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Response {
    let room = Room::User(user.id);
    ws.on_upgrade(move |socket| stream_room(socket, state, room))
}

async fn stream_room(socket: WebSocket, state: AppState, room: Room) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.hub.join(room).await;

    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(envelope) => {
                    if let Err(e) = send_event(&mut sender, &envelope).await {
                        tracing::debug!(%room, error = %e, "Send failed, closing feed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%room, skipped, "Slow subscriber dropped events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(%room, error = %e, "Receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => {
            send_task.abort();
            // The receiver must be dropped before the room is checked.
            let _ = send_task.await;
        }
    }

    state.hub.leave(room).await;
    tracing::debug!(%room, "Feed closed");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    envelope: &EventEnvelope,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(envelope).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}
