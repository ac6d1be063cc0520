#![allow(dead_code)]

use axum::Router;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use firewall_api::app::{AppState, Providers, build_router};
use firewall_api::catalog::naming::NamingPolicy;
use firewall_api::config::{FirewallApiConfig, GcpConfig, MemorySeed, ProviderBackend};
use firewall_api::store::memory::InMemoryProvider;
use firewall_authz::{GOOGLE_ISSUER, OWNER_ROLE, ProjectId};

pub const HOST: &str = "shared-vpc-host";
pub const SERVICE: &str = "tenant1";
pub const OWNER: &str = "owner@example.com";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

/// Unsigned identity token carrying `claims` as its payload.
pub fn credential_with(claims: serde_json::Value) -> String {
    format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

pub fn credential(email: &str) -> String {
    credential_with(serde_json::json!({
        "iss": GOOGLE_ISSUER,
        "email": email,
        "email_verified": true
    }))
}

pub fn bearer(email: &str) -> String {
    format!("Bearer {}", credential(email))
}

pub fn test_config(naming: NamingPolicy) -> FirewallApiConfig {
    FirewallApiConfig {
        bind_addr: "127.0.0.1:0".parse().expect("bind"),
        metrics_bind: "127.0.0.1:0".parse().expect("metrics"),
        provider: ProviderBackend::Memory,
        trusted_issuer: GOOGLE_ISSUER.to_string(),
        owner_role: OWNER_ROLE.to_string(),
        naming,
        gcp: GcpConfig::default(),
        memory_seed: MemorySeed::default(),
    }
}

/// Memory provider where `OWNER` owns `SERVICE` and `SERVICE` is attached to `HOST`.
pub async fn seeded_provider() -> InMemoryProvider {
    let provider = InMemoryProvider::new();
    provider
        .grant(
            &ProjectId::new(SERVICE),
            OWNER_ROLE,
            &format!("user:{OWNER}"),
        )
        .await;
    provider
        .attach(ProjectId::new(SERVICE), ProjectId::new(HOST))
        .await;
    provider
}

pub fn app_with(provider: InMemoryProvider, naming: NamingPolicy) -> Router {
    let state = AppState::new(&test_config(naming), Providers::memory(provider));
    build_router(state)
}

pub fn application_uri(application: &str) -> String {
    format!("/project/{HOST}/service_project/{SERVICE}/application/{application}")
}

pub fn rule_uri(application: &str, rule: &str) -> String {
    format!("{}/firewall_rule/{rule}", application_uri(application))
}
