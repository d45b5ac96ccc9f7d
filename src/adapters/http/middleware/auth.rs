//! Authentication middleware and extractors for axum.
//!
//! ```text
//! Request → auth_middleware → IdentityResolver → CurrentUser in extensions
//!                                                      ↓
//!                                  Handler → RequireUser reads from extensions
//! ```
//!
//! A request without a bearer token passes through untouched; routes that
//! need a caller use [`RequireUser`], which answers 401. A token that is
//! present but invalid is rejected here.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::adapters::http::error::ApiError;
use crate::application::IdentityResolver;
use crate::domain::tenancy::{AccessError, User};

/// The internal user resolved from the request's session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolves the bearer token (when present) to the internal user.
///
/// Browsers cannot set headers on a WebSocket handshake, so upgrade
/// requests may carry the token as an `access_token` query parameter
/// instead.
pub async fn auth_middleware(
    State(identity): State<IdentityResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers())
        .or_else(|| upgrade_query_token(&request))
        .map(str::to_owned);

    let Some(token) = token else {
        return next.run(request).await;
    };

    match identity.resolve_token(&token).await {
        Ok(user) => {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn upgrade_query_token(request: &Request) -> Option<&str> {
    let is_upgrade = request
        .headers()
        .get(header::UPGRADE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    if !is_upgrade {
        return None;
    }
    request
        .uri()
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("access_token="))
        .filter(|t| !t.is_empty())
}

/// Extractor that requires a resolved caller.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| RequireUser(current.0.clone()))
            .ok_or_else(|| AccessError::Unauthenticated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request as HttpRequest, StatusCode};

    use crate::domain::foundation::{AuthenticatedUser, Timestamp};

    fn user() -> User {
        User::first_seen(
            &AuthenticatedUser::new("idp|7", "sam@example.com", None, true),
            Timestamp::now(),
        )
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn query_token_only_counts_on_upgrade() {
        let plain = HttpRequest::builder()
            .uri("/me/events?access_token=tok")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(upgrade_query_token(&plain), None);

        let upgrade = HttpRequest::builder()
            .uri("/me/events?x=1&access_token=tok")
            .header(header::UPGRADE, "websocket")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(upgrade_query_token(&upgrade), Some("tok"));
    }

    #[tokio::test]
    async fn require_user_reads_extensions() {
        let mut request = HttpRequest::builder().uri("/me").body(()).unwrap();
        let expected = user();
        request.extensions_mut().insert(CurrentUser(expected.clone()));
        let (mut parts, _) = request.into_parts();

        let RequireUser(found) = RequireUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.id, expected.id);
    }

    #[tokio::test]
    async fn require_user_rejects_anonymous() {
        let (mut parts, _) = HttpRequest::builder().uri("/me").body(()).unwrap().into_parts();
        let err = RequireUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
