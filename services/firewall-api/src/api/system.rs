//! Health and discovery handlers.
//!
//! # Key invariants and assumptions
//! - The health check is local only; it never calls a provider, so a
//!   provider outage does not take the gateway out of rotation.
use crate::api::openapi::ApiDoc;
use crate::api::types::HealthStatus;
use axum::Json;
use utoipa::OpenApi;

#[utoipa::path(
    get,
    path = "/_health",
    tag = "system",
    responses(
        (status = 200, description = "Gateway is serving", body = HealthStatus)
    )
)]
pub(crate) async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
