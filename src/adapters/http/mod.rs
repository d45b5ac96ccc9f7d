//! HTTP adapter - the REST and WebSocket surface.
//!
//! Each resource module exposes `routes()`; [`router`] nests them and wraps
//! the whole tree in the auth, rate limit and tower-http layers.
//!
//! Every body is an envelope: `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"code", "message"}}`.

pub mod audit_log;
pub mod error;
pub mod gift_cards;
pub mod me;
pub mod members;
pub mod middleware;
pub mod orders;
pub mod payments;
pub mod platform;
pub mod pos;
pub mod realtime;
pub mod sessions;
pub mod state;
pub mod vouchers;
pub mod webhooks;

pub use error::{ApiError, ApiResponse};
pub use state::{AppState, WebhookVerifiers};

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{middleware as axum_middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use self::middleware::{auth_middleware, rate_limit_middleware, RateLimiterState};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the service. Without a limiter the rate limit layer is skipped.
pub fn router(
    state: AppState,
    rate_limiter: Option<RateLimiterState>,
    server: &ServerConfig,
) -> Router {
    let tenant_scoped = Router::new()
        .nest("/gift-cards", gift_cards::routes())
        .nest("/vouchers", vouchers::routes())
        .nest("/sessions", sessions::routes())
        .nest("/pos", pos::routes())
        .nest("/orders", orders::routes())
        .nest("/payments", payments::routes())
        .nest("/audit-logs", audit_log::routes())
        .route("/events", get(realtime::tenant_events))
        .merge(members::routes());

    let mut app = Router::new()
        .nest("/tenants/:tenant_id", tenant_scoped)
        .nest("/platform", platform::routes())
        .nest("/me", me::routes())
        .nest("/webhooks", webhooks::routes())
        .with_state(state.clone());

    // Layers added later run earlier: auth resolves the caller before the
    // limiter picks a user or IP key.
    if let Some(limiter) = rate_limiter {
        app = app.layer(axum_middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    app.layer(axum_middleware::from_fn_with_state(state.identity, auth_middleware))
        .route("/health", get(health))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors_layer(server))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
                user_id = tracing::field::Empty,
            )
        }))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
