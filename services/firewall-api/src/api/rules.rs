//! Firewall rule handlers.
//!
//! # Purpose
//! List, read, create and delete the rules of one tenant application. Every
//! handler authorizes the caller for `(project, service_project)` before the
//! catalog is touched.
//!
//! # Key invariants and assumptions
//! - Authorization runs before the create body is decoded, so unauthorized
//!   callers learn nothing about payload validation.
//! - `project` is the shared VPC host project that owns the rules.
use crate::api::authorize_request;
use crate::api::error::{ApiError, BODY_DECODE_MESSAGE, api_catalog, api_validation_error};
use crate::api::types::{ApplicationPath, ErrorResponse, RulePath};
use crate::app::AppState;
use crate::catalog::naming::RuleScope;
use crate::model::{ApplicationRuleView, FirewallRule, LogicalRuleKey};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use firewall_authz::ProjectId;

impl RulePath {
    fn into_key(self) -> LogicalRuleKey {
        LogicalRuleKey {
            host_project: ProjectId::new(self.project),
            service_project: ProjectId::new(self.service_project),
            application: self.application,
            alias: self.rule,
        }
    }
}

#[utoipa::path(
    get,
    path = "/project/{project}/service_project/{service_project}/application/{application}",
    tag = "firewall_rules",
    params(
        ("project" = String, Path, description = "Shared VPC host project"),
        ("service_project" = String, Path, description = "Service project owning the application"),
        ("application" = String, Path, description = "Application name")
    ),
    responses(
        (status = 200, description = "Rules of the application", body = ApplicationRuleView),
        (status = 400, description = "Invalid bearer credential", body = ErrorResponse),
        (status = 403, description = "Caller may not manage this application", body = ErrorResponse)
    )
)]
pub(crate) async fn list_rules(
    Path(path): Path<ApplicationPath>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApplicationRuleView>, ApiError> {
    let host_project = ProjectId::new(path.project);
    let scope = RuleScope::new(ProjectId::new(path.service_project), path.application);
    authorize_request(&state, &headers, &host_project, &scope.service_project).await?;
    let view = state
        .catalog
        .list(&host_project, &scope)
        .await
        .map_err(|err| api_catalog(&err))?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/project/{project}/service_project/{service_project}/application/{application}/firewall_rule/{rule}",
    tag = "firewall_rules",
    params(
        ("project" = String, Path, description = "Shared VPC host project"),
        ("service_project" = String, Path, description = "Service project owning the application"),
        ("application" = String, Path, description = "Application name"),
        ("rule" = String, Path, description = "Rule alias")
    ),
    responses(
        (status = 200, description = "Fetch rule", body = ApplicationRuleView),
        (status = 400, description = "Invalid bearer credential", body = ErrorResponse),
        (status = 403, description = "Caller may not manage this application", body = ErrorResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse)
    )
)]
pub(crate) async fn get_rule(
    Path(path): Path<RulePath>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApplicationRuleView>, ApiError> {
    let key = path.into_key();
    authorize_request(&state, &headers, &key.host_project, &key.service_project).await?;
    let view = state
        .catalog
        .get(&key)
        .await
        .map_err(|err| api_catalog(&err))?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/project/{project}/service_project/{service_project}/application/{application}/firewall_rule/{rule}",
    tag = "firewall_rules",
    params(
        ("project" = String, Path, description = "Shared VPC host project"),
        ("service_project" = String, Path, description = "Service project owning the application"),
        ("application" = String, Path, description = "Application name"),
        ("rule" = String, Path, description = "Rule alias")
    ),
    request_body = FirewallRule,
    responses(
        (status = 201, description = "Rule created", body = ApplicationRuleView),
        (status = 400, description = "Invalid bearer credential or body", body = ErrorResponse),
        (status = 403, description = "Caller may not manage this application", body = ErrorResponse),
        (status = 409, description = "Rule already exists", body = ErrorResponse)
    )
)]
pub(crate) async fn create_rule(
    Path(path): Path<RulePath>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<FirewallRule>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let key = path.into_key();
    let identity =
        authorize_request(&state, &headers, &key.host_project, &key.service_project).await?;
    let Json(rule) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected firewall rule body");
        api_validation_error(BODY_DECODE_MESSAGE)
    })?;
    let view = state
        .catalog
        .create(&key, rule)
        .await
        .map_err(|err| api_catalog(&err))?;
    tracing::info!(
        email = %identity.email,
        host_project = %key.host_project,
        rule_name = %key.physical_name(),
        "firewall rule created"
    );
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    delete,
    path = "/project/{project}/service_project/{service_project}/application/{application}/firewall_rule/{rule}",
    tag = "firewall_rules",
    params(
        ("project" = String, Path, description = "Shared VPC host project"),
        ("service_project" = String, Path, description = "Service project owning the application"),
        ("application" = String, Path, description = "Application name"),
        ("rule" = String, Path, description = "Rule alias")
    ),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 400, description = "Invalid bearer credential", body = ErrorResponse),
        (status = 403, description = "Caller may not manage this application", body = ErrorResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_rule(
    Path(path): Path<RulePath>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let key = path.into_key();
    let identity =
        authorize_request(&state, &headers, &key.host_project, &key.service_project).await?;
    state
        .catalog
        .delete(&key)
        .await
        .map_err(|err| api_catalog(&err))?;
    tracing::info!(
        email = %identity.email,
        host_project = %key.host_project,
        rule_name = %key.physical_name(),
        "firewall rule deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
