//! Gateway HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules plus the request admission helper shared by
//! every rule endpoint.
pub mod error;
pub mod fallback;
pub mod openapi;
pub mod rules;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_authz};
use crate::app::AppState;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use firewall_authz::{AuthzError, Identity, ProjectId};

/// Bearer credential from the `Authorization` header.
///
/// The `Bearer ` prefix is optional. A missing or non-UTF-8 header yields an
/// empty credential, which the decoder rejects as malformed.
pub(crate) fn bearer_credential(headers: &HeaderMap) -> &str {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
        .unwrap_or("")
}

pub(crate) async fn authorize_request(
    state: &AppState,
    headers: &HeaderMap,
    host_project: &ProjectId,
    service_project: &ProjectId,
) -> Result<Identity, ApiError> {
    let result = state
        .pipeline
        .authorize(bearer_credential(headers), host_project, service_project)
        .await;
    let outcome = match &result {
        Ok(_) => "allowed",
        Err(AuthzError::InvalidCredential(_)) => "invalid_credential",
        Err(AuthzError::Forbidden { .. }) => "forbidden",
        Err(AuthzError::Provider(_)) => "provider_error",
    };
    metrics::counter!("firewall_api_authz_decisions_total", "outcome" => outcome).increment(1);
    result.map_err(|err| api_authz(&err))
}
