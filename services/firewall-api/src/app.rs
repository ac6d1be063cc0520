//! Gateway HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and assembles the shared
//! application state injected into handlers.
//!
//! # Notes
//! Unknown paths and unsupported methods answer with the JSON error shape
//! instead of Axum's empty defaults.
use crate::api;
use crate::api::fallback::{method_not_allowed, not_found};
use crate::catalog::RuleCatalog;
use crate::config::{FirewallApiConfig, ProviderBackend};
use crate::observability;
use crate::store::RuleStore;
use crate::store::gcp::GcpProvider;
use crate::store::memory::InMemoryProvider;
use axum::Router;
use axum::routing::get;
use firewall_authz::{
    AuthorizationPipeline, HierarchyVerifier, HostLinkProvider, OwnershipVerifier, PolicyProvider,
    TokenDecoder,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: AuthorizationPipeline,
    pub catalog: RuleCatalog,
}

/// Provider handles backing one gateway instance.
///
/// A single backend usually implements all three traits; the handles are kept
/// separate so tests can mix fakes.
#[derive(Clone)]
pub struct Providers {
    pub policies: Arc<dyn PolicyProvider>,
    pub host_links: Arc<dyn HostLinkProvider>,
    pub rules: Arc<dyn RuleStore>,
}

impl Providers {
    pub fn memory(provider: InMemoryProvider) -> Self {
        let provider = Arc::new(provider);
        Self {
            policies: provider.clone(),
            host_links: provider.clone(),
            rules: provider,
        }
    }

    pub fn gcp(provider: GcpProvider) -> Self {
        let provider = Arc::new(provider);
        Self {
            policies: provider.clone(),
            host_links: provider.clone(),
            rules: provider,
        }
    }
}

impl AppState {
    pub fn new(config: &FirewallApiConfig, providers: Providers) -> Self {
        let pipeline = AuthorizationPipeline::new(
            TokenDecoder::new(config.trusted_issuer.clone()),
            OwnershipVerifier::new(providers.policies).with_owner_role(config.owner_role.clone()),
            HierarchyVerifier::new(providers.host_links),
        );
        let catalog = RuleCatalog::new(providers.rules).with_naming_policy(config.naming);
        Self { pipeline, catalog }
    }
}

pub async fn build_state(config: &FirewallApiConfig) -> anyhow::Result<AppState> {
    let providers = match config.provider {
        ProviderBackend::Memory => {
            let provider = InMemoryProvider::new();
            provider.apply_seed(&config.memory_seed).await;
            Providers::memory(provider)
        }
        ProviderBackend::Gcp => Providers::gcp(GcpProvider::new(&config.gcp)?),
    };
    Ok(AppState::new(config, providers))
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/_health", get(api::system::health))
        .route("/openapi.json", get(api::system::openapi_json))
        .route(
            "/project/:project/service_project/:service_project/application/:application",
            get(api::rules::list_rules).fallback(method_not_allowed),
        )
        .route(
            "/project/:project/service_project/:service_project/application/:application/firewall_rule/:rule",
            get(api::rules::get_rule)
                .post(api::rules::create_rule)
                .delete(api::rules::delete_rule)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(trace_layer)
        .with_state(state)
}
