//! Google Cloud REST backend.
//!
//! # Purpose
//! Talks to Cloud Resource Manager (`getIamPolicy`) and Compute
//! (`getXpnHost`, `firewalls.*`) with a pre-minted OAuth access token.
//!
//! # Error mapping
//! - Non-2xx responses carrying `{"error": {"code", "message"}}` become a
//!   [`ProviderError`] with that code and message; other bodies keep the HTTP
//!   status.
//! - Transport and decode failures use code `0`.
//! - A 404 on a named firewall (get/delete) is [`StoreError::NotFound`].
//!
//! # Operations
//! Firewall inserts and deletes return a global operation. It is polled until
//! `DONE` so a read right after a write sees the result. A finished operation
//! carrying an `error` becomes a [`ProviderError`] with its HTTP status.
use super::{RuleStore, StoreError, StoreResult};
use crate::config::GcpConfig;
use crate::model::FirewallRule;
use anyhow::Context;
use async_trait::async_trait;
use firewall_authz::{
    HostLink, HostLinkProvider, Policy, PolicyProvider, ProjectId, ProviderError,
};
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com";
pub const RESOURCE_MANAGER_ENDPOINT: &str = "https://cloudresourcemanager.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const OPERATION_POLL_INTERVAL: Duration = Duration::from_millis(500);
const OPERATION_POLL_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone)]
pub struct GcpProvider {
    client: reqwest::Client,
    compute_endpoint: String,
    resource_manager_endpoint: String,
    access_token: Option<String>,
    poll_interval: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirewallPage {
    #[serde(default)]
    items: Vec<FirewallRule>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct XpnHost {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
    error: Option<OperationErrors>,
    http_error_status_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct OperationErrors {
    #[serde(default)]
    errors: Vec<OperationErrorItem>,
}

#[derive(Debug, Deserialize)]
struct OperationErrorItem {
    #[serde(default)]
    message: String,
}

impl Operation {
    fn is_done(&self) -> bool {
        self.status == "DONE"
    }

    fn into_result(self) -> Result<(), ProviderError> {
        let Some(error) = self.error else {
            return Ok(());
        };
        let message = error
            .errors
            .into_iter()
            .map(|item| item.message)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ProviderError::new(self.http_error_status_code.unwrap_or(500), message))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl GcpProvider {
    pub fn new(config: &GcpConfig) -> anyhow::Result<Self> {
        if config.access_token.is_none() {
            tracing::warn!("no provider access token configured; requests go out unauthenticated");
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build provider http client")?;
        Ok(Self {
            client,
            compute_endpoint: config.compute_endpoint.clone(),
            resource_manager_endpoint: config.resource_manager_endpoint.clone(),
            access_token: config.access_token.clone(),
            poll_interval: OPERATION_POLL_INTERVAL,
        })
    }

    /// Poll `operation` in `project` until it is done.
    async fn await_operation(
        &self,
        project: &ProjectId,
        response: Response,
    ) -> Result<(), ProviderError> {
        let mut operation: Operation = decode("operation", response).await?;
        for _ in 0..OPERATION_POLL_ATTEMPTS {
            if operation.is_done() {
                return operation.into_result();
            }
            if operation.name.is_empty() {
                return Err(ProviderError::transport("pending operation without a name"));
            }
            tokio::time::sleep(self.poll_interval).await;
            let url = endpoint_url(
                &self.compute_endpoint,
                &[
                    "compute",
                    "v1",
                    "projects",
                    project.as_str(),
                    "global",
                    "operations",
                    &operation.name,
                ],
            )?;
            let response = self.send("globalOperations.get", self.client.get(url)).await?;
            operation = decode("globalOperations.get", response).await?;
        }
        tracing::warn!(operation = %operation.name, "provider operation still pending");
        Err(ProviderError::new(504, format!("operation {} did not finish", operation.name)))
    }

    fn firewalls_url(
        &self,
        project: &ProjectId,
        name: Option<&str>,
    ) -> Result<Url, ProviderError> {
        let mut segments = vec![
            "compute",
            "v1",
            "projects",
            project.as_str(),
            "global",
            "firewalls",
        ];
        segments.extend(name);
        endpoint_url(&self.compute_endpoint, &segments)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ProviderError> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(|err| {
            metrics::counter!(
                "firewall_api_provider_requests_total",
                "operation" => operation,
                "status" => "transport"
            )
            .increment(1);
            tracing::warn!(operation, error = %err, "provider request failed");
            ProviderError::transport(format!("{operation}: {err}"))
        })?;
        let status = response.status();
        metrics::counter!(
            "firewall_api_provider_requests_total",
            "operation" => operation,
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        if status.is_success() {
            return Ok(response);
        }
        let err = error_from_response(response).await;
        tracing::debug!(
            operation,
            code = err.code,
            message = %err.message,
            "provider rejected request"
        );
        Err(err)
    }
}

fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base)
        .map_err(|err| ProviderError::transport(format!("invalid endpoint {base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::transport(format!("invalid endpoint {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ProviderError::transport(format!("decode {operation} response: {err}")))
}

async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = match envelope.error.code {
            0 => status.as_u16(),
            code => code,
        };
        return ProviderError::new(code, envelope.error.message);
    }
    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("unexpected provider response"),
        text => text,
    };
    ProviderError::new(status.as_u16(), message)
}

#[async_trait]
impl PolicyProvider for GcpProvider {
    async fn get_policy(&self, project: &ProjectId) -> Result<Policy, ProviderError> {
        let resource = format!("{project}:getIamPolicy");
        let url = endpoint_url(
            &self.resource_manager_endpoint,
            &["v1", "projects", &resource],
        )?;
        let request = self.client.post(url).json(&serde_json::json!({}));
        let response = self.send("projects.getIamPolicy", request).await?;
        decode("projects.getIamPolicy", response).await
    }
}

#[async_trait]
impl HostLinkProvider for GcpProvider {
    async fn get_host_link(&self, project: &ProjectId) -> Result<Option<HostLink>, ProviderError> {
        let url = endpoint_url(
            &self.compute_endpoint,
            &["compute", "v1", "projects", project.as_str(), "getXpnHost"],
        )?;
        let response = self.send("projects.getXpnHost", self.client.get(url)).await?;
        let body = response
            .text()
            .await
            .map_err(|err| ProviderError::transport(format!("read getXpnHost response: {err}")))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let host: XpnHost = serde_json::from_str(&body)
            .map_err(|err| ProviderError::transport(format!("decode getXpnHost response: {err}")))?;
        Ok(host
            .name
            .filter(|name| !name.is_empty())
            .map(|name| HostLink { name }))
    }
}

#[async_trait]
impl RuleStore for GcpProvider {
    async fn list_rules(&self, project: &ProjectId) -> StoreResult<Vec<FirewallRule>> {
        let url = self.firewalls_url(project, None)?;
        let mut rules = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.client.get(url.clone());
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let response = self.send("firewalls.list", request).await?;
            let page: FirewallPage = decode("firewalls.list", response).await?;
            rules.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(rules)
    }

    async fn get_rule(&self, project: &ProjectId, name: &str) -> StoreResult<FirewallRule> {
        let url = self.firewalls_url(project, Some(name))?;
        match self.send("firewalls.get", self.client.get(url)).await {
            Ok(response) => Ok(decode("firewalls.get", response).await?),
            Err(err) if err.is_not_found() => Err(StoreError::NotFound(name.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_rule(&self, project: &ProjectId, rule: FirewallRule) -> StoreResult<()> {
        let url = self.firewalls_url(project, None)?;
        let response = self
            .send("firewalls.insert", self.client.post(url).json(&rule))
            .await?;
        self.await_operation(project, response).await?;
        Ok(())
    }

    async fn delete_rule(&self, project: &ProjectId, name: &str) -> StoreResult<()> {
        let url = self.firewalls_url(project, Some(name))?;
        match self.send("firewalls.delete", self.client.delete(url)).await {
            Ok(response) => Ok(self.await_operation(project, response).await?),
            Err(err) if err.is_not_found() => Err(StoreError::NotFound(name.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "gcp"
    }
}
