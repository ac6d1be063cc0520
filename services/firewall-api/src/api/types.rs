//! HTTP API request/response types.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// Path parameters addressing one tenant application.
#[derive(Debug, Deserialize)]
pub struct ApplicationPath {
    pub project: String,
    pub service_project: String,
    pub application: String,
}

/// Path parameters addressing one rule of a tenant application.
#[derive(Debug, Deserialize)]
pub struct RulePath {
    pub project: String,
    pub service_project: String,
    pub application: String,
    pub rule: String,
}
