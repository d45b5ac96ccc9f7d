//! Response envelope and error mapping for the REST surface.
//!
//! Success bodies are `{"success": true, "data": ...}`. Failures are
//! `{"success": false, "error": {"code": ..., "message": ...}}` with the
//! status taken from the error's [`ErrorKind`]:
//!
//! | Kind | Status |
//! |------|--------|
//! | Unauthorized | 401 |
//! | Forbidden | 403 |
//! | NotFound | 404 |
//! | Validation | 400 |
//! | InvariantViolation | 422 |
//! | RateLimited | 429 |
//! | Internal | 500 |
//!
//! Internal failures are logged in full and answered with an opaque message.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode, ErrorKind};
use crate::domain::ledger::LedgerError;
use crate::domain::payment::WebhookError;
use crate::domain::tenancy::AccessError;

pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// 200 with the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

/// 201 with the success envelope.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl ToString, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, message)
    }

    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::RateLimited,
            "Too many requests, slow down",
        )
    }

    /// Builds the response for `code`. Internal kinds log `detail` and hide
    /// it from the caller.
    fn from_code(code: ErrorCode, message: String) -> Self {
        let kind = code.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(code = %code, error = %message, "Request failed");
            return Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, INTERNAL_MESSAGE);
        }
        Self::new(status_for(kind), code, message)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::InvariantViolation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        ApiError::from_code(err.code(), err.message())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::from_code(err.code(), err.message())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::from_code(err.code, err.message)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        let status = err.status_code();
        if status.is_server_error() {
            tracing::error!(error = %err, retryable = err.is_retryable(), "Webhook processing failed");
            return Self::new(status, ErrorCode::InternalError, INTERNAL_MESSAGE);
        }
        tracing::warn!(error = %err, "Webhook rejected");
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: &self.code,
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// `Json` extractor whose rejections use the error envelope.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, TenantId};
    use crate::domain::tenancy::Role;

    #[test]
    fn invariant_violations_are_422() {
        let err = ApiError::from(LedgerError::InsufficientBalance {
            requested: Money::from_cents(100),
            available: Money::ZERO,
        });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn access_errors_map_to_401_and_403() {
        assert_eq!(ApiError::from(AccessError::Unauthenticated).status, StatusCode::UNAUTHORIZED);
        let forbidden = ApiError::from(AccessError::NoTenantAccess {
            tenant_id: TenantId::new(),
        });
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        let role = ApiError::from(AccessError::InsufficientRole {
            required: Role::Admin,
            actual: Role::Staff,
        });
        assert_eq!(role.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_resources_are_404() {
        let err = ApiError::from(LedgerError::not_found("gift_card"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "GIFT_CARD_NOT_FOUND");
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::from(LedgerError::infrastructure("relation \"gift_cards\" does not exist"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, INTERNAL_MESSAGE);
        assert_eq!(err.code, "INTERNAL_ERROR");
    }

    #[test]
    fn bad_signature_is_400() {
        let err = ApiError::from(WebhookError::InvalidSignature);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_SIGNATURE");
    }

    #[test]
    fn envelope_shape() {
        let body = serde_json::to_value(ok(serde_json::json!({"remainingBalance": 3000})).0).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["remainingBalance"], 3000);
    }
}
