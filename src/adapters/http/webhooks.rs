//! Payment gateway callbacks: `POST /webhooks/:gateway`.
//!
//! Unauthenticated; the gateway signature is the credential. Once the
//! signature checks out the response is 200 whether or not the payment is
//! known, so gateways stop retrying deliveries we can never apply.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde_json::json;

use crate::application::handlers::payment::{ReconcileWebhookCommand, WebhookHeaders};
use crate::domain::payment::{Gateway, WebhookError};

use super::error::{ok, ApiError};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:gateway", post(receive))
}

async fn receive(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let gateway = Gateway::from_path(&gateway).ok_or(WebhookError::UnsupportedGateway(gateway))?;

    let outcome = state
        .reconciler
        .handle(ReconcileWebhookCommand {
            gateway,
            payload: body.to_vec(),
            headers: signature_headers(&headers),
        })
        .await?;

    tracing::debug!(gateway = gateway.as_str(), ?outcome, "Webhook processed");
    Ok(ok(json!({ "received": true })))
}

fn signature_headers(headers: &HeaderMap) -> WebhookHeaders {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    WebhookHeaders {
        stripe_signature: get("stripe-signature"),
        signature: get("x-signature"),
        nonce_str: get("x-nonce-str"),
        timestamp: get("x-timestamp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_are_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("Stripe-Signature", "t=1,v1=ab".parse().unwrap());
        headers.insert("X-Nonce-Str", "nonce".parse().unwrap());

        let extracted = signature_headers(&headers);
        assert_eq!(extracted.stripe_signature.as_deref(), Some("t=1,v1=ab"));
        assert_eq!(extracted.nonce_str.as_deref(), Some("nonce"));
        assert!(extracted.signature.is_none());
    }
}
