//! In-memory provider backend.
//!
//! # Purpose
//! Implements [`RuleStore`], [`PolicyProvider`] and [`HostLinkProvider`]
//! entirely in memory. Used for local runs and tests; nothing survives a
//! restart.
//!
//! # Behaviour
//! - Rules keep insertion order per project, which stands in for provider
//!   listing order.
//! - Inserting a name that already exists fails with a 409 provider error, as
//!   the real firewall API does.
//! - Inserted rules get a provider-assigned `id` so reads after a create show
//!   server-populated fields.
//! - A project without a stored policy has no bindings.
//! - The binary fills it from the `memory_seed` section of the YAML config.
use super::{RuleStore, StoreError, StoreResult};
use crate::config::MemorySeed;
use crate::model::FirewallRule;
use async_trait::async_trait;
use firewall_authz::{
    Binding, HostLink, HostLinkProvider, Policy, PolicyProvider, ProjectId, ProviderError,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryProvider {
    policies: Arc<RwLock<HashMap<ProjectId, Policy>>>,
    host_links: Arc<RwLock<HashMap<ProjectId, ProjectId>>>,
    rules: Arc<RwLock<HashMap<ProjectId, Vec<FirewallRule>>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_policy(&self, project: ProjectId, policy: Policy) {
        self.policies.write().await.insert(project, policy);
    }

    /// Add `member` to the binding for `role` on `project`.
    pub async fn grant(&self, project: &ProjectId, role: &str, member: &str) {
        let mut policies = self.policies.write().await;
        let policy = policies.entry(project.clone()).or_default();
        match policy.bindings.iter_mut().find(|binding| binding.role == role) {
            Some(binding) => binding.members.push(member.to_string()),
            None => policy.bindings.push(Binding {
                role: role.to_string(),
                members: vec![member.to_string()],
            }),
        }
    }

    /// Register `service_project` as a service project of `host_project`.
    pub async fn attach(&self, service_project: ProjectId, host_project: ProjectId) {
        self.host_links
            .write()
            .await
            .insert(service_project, host_project);
    }

    /// Load configured policies, host links and rules.
    pub async fn apply_seed(&self, seed: &MemorySeed) {
        for (project, policy) in &seed.policies {
            self.set_policy(ProjectId::new(project.as_str()), policy.clone()).await;
        }
        for (service_project, host_project) in &seed.host_links {
            self.attach(
                ProjectId::new(service_project.as_str()),
                ProjectId::new(host_project.as_str()),
            )
            .await;
        }
        for (project, rules) in &seed.rules {
            for rule in rules {
                self.seed_rule(ProjectId::new(project.as_str()), rule.clone()).await;
            }
        }
        tracing::info!(
            policies = seed.policies.len(),
            host_links = seed.host_links.len(),
            rules = seed.rules.values().map(Vec::len).sum::<usize>(),
            "memory backend seeded"
        );
    }

    /// Store `rule` without conflict checks or server-populated fields.
    pub async fn seed_rule(&self, project: ProjectId, rule: FirewallRule) {
        self.rules.write().await.entry(project).or_default().push(rule);
    }

    fn already_exists(project: &ProjectId, name: &str) -> ProviderError {
        ProviderError::new(
            409,
            format!("The resource 'projects/{project}/global/firewalls/{name}' already exists"),
        )
    }
}

#[async_trait]
impl PolicyProvider for InMemoryProvider {
    async fn get_policy(&self, project: &ProjectId) -> Result<Policy, ProviderError> {
        Ok(self
            .policies
            .read()
            .await
            .get(project)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl HostLinkProvider for InMemoryProvider {
    async fn get_host_link(&self, project: &ProjectId) -> Result<Option<HostLink>, ProviderError> {
        Ok(self.host_links.read().await.get(project).map(|host| HostLink {
            name: host.as_str().to_string(),
        }))
    }
}

#[async_trait]
impl RuleStore for InMemoryProvider {
    async fn list_rules(&self, project: &ProjectId) -> StoreResult<Vec<FirewallRule>> {
        Ok(self
            .rules
            .read()
            .await
            .get(project)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_rule(&self, project: &ProjectId, name: &str) -> StoreResult<FirewallRule> {
        self.rules
            .read()
            .await
            .get(project)
            .and_then(|rules| rules.iter().find(|rule| rule.name == name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn insert_rule(&self, project: &ProjectId, mut rule: FirewallRule) -> StoreResult<()> {
        let mut rules = self.rules.write().await;
        let entries = rules.entry(project.clone()).or_default();
        if entries.iter().any(|existing| existing.name == rule.name) {
            return Err(Self::already_exists(project, &rule.name).into());
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        rule.extra.insert("id".to_string(), id.to_string().into());
        entries.push(rule);
        metrics::gauge!("firewall_api_memory_rules_total")
            .set(rules.values().map(Vec::len).sum::<usize>() as f64);
        Ok(())
    }

    async fn delete_rule(&self, project: &ProjectId, name: &str) -> StoreResult<()> {
        let mut rules = self.rules.write().await;
        let entries = rules
            .get_mut(project)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let position = entries
            .iter()
            .position(|rule| rule.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        entries.remove(position);
        metrics::gauge!("firewall_api_memory_rules_total")
            .set(rules.values().map(Vec::len).sum::<usize>() as f64);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
