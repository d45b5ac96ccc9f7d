//! Rate limiting middleware for axum.
//!
//! Every request counts against the global window, then against the
//! caller's own window: the user id when the auth middleware resolved one,
//! the client address otherwise. Limiter outages fail open.
//!
//! Allowed responses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset`; a 429 carries `Retry-After`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::auth::CurrentUser;
use crate::ports::{RateLimitDenied, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter};

pub type RateLimiterState = Arc<dyn RateLimiter>;

pub mod headers {
    use super::HeaderName;

    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    // Global window first: it protects the instance as a whole
    if let Some(denied) = check(&limiter, &RateLimitKey::global()).await.and_then(Result::err) {
        return rate_limit_response(&denied);
    }

    let caller_key = match request.extensions().get::<CurrentUser>() {
        Some(CurrentUser(user)) => Some(RateLimitKey::user(user.id)),
        None => extract_client_ip(request.headers(), connect_info.as_ref()).map(RateLimitKey::ip),
    };

    let status = match &caller_key {
        Some(key) => match check(&limiter, key).await {
            Some(Err(denied)) => {
                tracing::debug!(key = %key.storage_key(), "Rate limit exceeded");
                return rate_limit_response(&denied);
            }
            Some(Ok(status)) => Some(status),
            None => None,
        },
        None => None,
    };

    let mut response = next.run(request).await;
    if let Some(status) = status {
        add_rate_limit_headers(response.headers_mut(), &status);
    }
    response
}

/// `None` when the limiter is unavailable.
async fn check(
    limiter: &RateLimiterState,
    key: &RateLimitKey,
) -> Option<Result<RateLimitStatus, RateLimitDenied>> {
    match limiter.check(key).await {
        Ok(RateLimitResult::Allowed(status)) => Some(Ok(status)),
        Ok(RateLimitResult::Denied(denied)) => Some(Err(denied)),
        Err(e) => {
            tracing::warn!(scope = %key.scope, error = %e, "Rate limiter unavailable, allowing request");
            None
        }
    }
}

/// Client address, preferring the first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer.
fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

    if let Some(first) = header("x-forwarded-for").and_then(|v| v.split(',').next()) {
        let first = first.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    if let Some(real_ip) = header("x-real-ip") {
        return Some(real_ip.trim().to_string());
    }
    connect_info.map(|ci| ci.0.ip().to_string())
}

fn rate_limit_response(denied: &RateLimitDenied) -> Response {
    let mut response = ApiError::rate_limited().into_response();
    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(denied.limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
    headers.insert(
        axum::http::header::RETRY_AFTER,
        HeaderValue::from(denied.retry_after_secs.max(1)),
    );
    response
}

fn add_rate_limit_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(status.remaining));
    headers.insert(
        headers::X_RATELIMIT_RESET.clone(),
        HeaderValue::from(status.reset_at.as_unix_secs()),
    );
}
