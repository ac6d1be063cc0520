//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint, including
//! the 404/405 fallbacks, answers with the same JSON shape.
//!
//! # Where it fits
//! Handlers map [`AuthzError`] and [`CatalogError`] through [`api_authz`] and
//! [`api_catalog`]; nothing else decides status codes.
//!
//! # Key invariants and assumptions
//! - Error responses always carry a stable `code` and a human-readable `message`.
//! - Provider failures keep the upstream status when it is a 4xx/5xx.
//!
//! # Security considerations
//! - Internal errors log details server-side but return a generic message.
//! - Forbidden reasons are fixed strings; policy contents are never echoed.
use crate::api::types::ErrorResponse;
use crate::catalog::CatalogError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use firewall_authz::{AuthzError, CredentialError, ProviderError};

pub const NOT_FOUND_MESSAGE: &str = "Not Found";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";
pub const RULE_NOT_FOUND_MESSAGE: &str = "firewall rule not found";
pub const BODY_DECODE_MESSAGE: &str = "failed to decode body";

/// Structured API error returned by handlers.
///
/// # What it does
/// Couples an HTTP status code with a JSON error body.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use firewall_api::api::error::api_forbidden;
///
/// let err = api_forbidden("user does not have owner rights on service project");
/// assert_eq!(err.status, StatusCode::FORBIDDEN);
/// assert_eq!(err.body.code, "forbidden");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.into(),
                request_id: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 405 Method Not Allowed error.
pub fn api_method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        METHOD_NOT_ALLOWED_MESSAGE,
    )
}

/// Build a 400 error for a rejected bearer credential.
///
/// # What it does
/// Prefixes the credential failure with the remediation hint.
pub fn api_invalid_credential(err: &CredentialError) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "invalid_credential",
        err.client_message(),
    )
}

/// Build a 403 Forbidden error.
pub fn api_forbidden(reason: &str) -> ApiError {
    ApiError::new(StatusCode::FORBIDDEN, "forbidden", reason)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Build a 500 Internal Server Error from an unexpected failure.
///
/// # What it does
/// Logs the failure and returns a generic internal error response.
///
/// # Errors
/// - Does not fail.
pub fn api_internal(context: &str, err: &dyn std::error::Error) -> ApiError {
    // Details stay in the log; the caller only sees the generic message.
    tracing::error!(error = %err, context, "firewall api internal error");
    api_internal_message(INTERNAL_ERROR_MESSAGE)
}

/// Build a 500 Internal Server Error without an underlying error.
pub fn api_internal_message(message: &str) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Map an upstream provider failure.
///
/// # What it does
/// Reuses the upstream status (quota 429, conflict 409, ...) when it is a
/// client or server error status. Anything else, including transport
/// failures (code `0`), becomes a 500.
pub fn api_provider(err: &ProviderError) -> ApiError {
    match StatusCode::from_u16(err.code) {
        Ok(status) if status.is_client_error() || status.is_server_error() => {
            tracing::warn!(code = err.code, message = %err.message, "provider error");
            ApiError::new(
                status,
                "provider_error",
                format!("Google error: {}", err.message),
            )
        }
        _ => api_internal("provider call failed", err),
    }
}

/// Map an authorization failure.
pub fn api_authz(err: &AuthzError) -> ApiError {
    match err {
        AuthzError::InvalidCredential(err) => api_invalid_credential(err),
        AuthzError::Forbidden { reason } => api_forbidden(reason),
        AuthzError::Provider(err) => api_provider(err),
    }
}

/// Map a catalog failure.
pub fn api_catalog(err: &CatalogError) -> ApiError {
    match err {
        CatalogError::RuleNotFound(_) => api_not_found(RULE_NOT_FOUND_MESSAGE),
        CatalogError::InvalidName(err) => api_validation_error(&err.to_string()),
        CatalogError::Provider(err) => api_provider(err),
        CatalogError::NameMismatch(err) => api_internal("rule name outside scope", err),
    }
}
