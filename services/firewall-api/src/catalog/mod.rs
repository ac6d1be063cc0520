//! Logical rule operations on top of a [`RuleStore`].
//!
//! # Purpose
//! Lists, reads, creates and deletes the rules of one tenant application,
//! translating between aliases and physical provider names with [`naming`].
//!
//! # Key invariants
//! - Callers must have authorized the request for the key's host and service
//!   project; the catalog does no access checks of its own.
//! - Listing only returns rules carrying the scope prefix, in provider order.
//! - Created rules always get the physical name and the physical tag, whatever
//!   the caller sent.
//! - A rule read back without the expected prefix is a [`CatalogError::NameMismatch`],
//!   never silently renamed.
//!
//! # Notes
//! Every call goes to the store. There is no caching and no retry.
pub mod naming;

use crate::model::{ApplicationRuleView, FirewallRule, LogicalRuleKey, RuleEntry};
use crate::store::{RuleStore, StoreError};
use firewall_authz::{ProjectId, ProviderError};
use naming::{InvalidName, NameMismatch, NamingPolicy, RuleScope};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rule not found: {0}")]
    RuleNotFound(String),
    #[error(transparent)]
    InvalidName(#[from] InvalidName),
    #[error(transparent)]
    NameMismatch(#[from] NameMismatch),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(name) => Self::RuleNotFound(name),
            StoreError::Provider(err) => Self::Provider(err),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Clone)]
pub struct RuleCatalog {
    store: Arc<dyn RuleStore>,
    naming: NamingPolicy,
}

impl RuleCatalog {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self {
            store,
            naming: NamingPolicy::default(),
        }
    }

    pub fn with_naming_policy(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    pub fn naming_policy(&self) -> NamingPolicy {
        self.naming
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Rules of `scope` inside `host_project`, in provider order.
    pub async fn list(
        &self,
        host_project: &ProjectId,
        scope: &RuleScope,
    ) -> CatalogResult<ApplicationRuleView> {
        self.naming.check_application(&scope.application)?;
        tracing::debug!(
            %host_project,
            service_project = %scope.service_project,
            application = %scope.application,
            "listing firewall rules"
        );
        let rules = self.store.list_rules(host_project).await?;
        let entries = rules
            .into_iter()
            .filter(|rule| self.in_scope(scope, &rule.name))
            .map(|rule| entry(scope, rule))
            .collect::<CatalogResult<Vec<_>>>()?;
        tracing::debug!(count = entries.len(), "listed firewall rules");
        Ok(view(host_project, scope, entries))
    }

    pub async fn get(&self, key: &LogicalRuleKey) -> CatalogResult<ApplicationRuleView> {
        self.check_key(key)?;
        let rule_name = key.physical_name();
        tracing::debug!(
            host_project = %key.host_project,
            service_project = %key.service_project,
            application = %key.application,
            %rule_name,
            "reading firewall rule"
        );
        let rule = self.store.get_rule(&key.host_project, &rule_name).await?;
        self.single(key, rule)
    }

    /// Insert `rule` under the key's physical name and tag, then read it back.
    ///
    /// The returned view reflects the stored rule, including fields the
    /// provider fills in. An existing rule with the same name is not replaced.
    pub async fn create(
        &self,
        key: &LogicalRuleKey,
        mut rule: FirewallRule,
    ) -> CatalogResult<ApplicationRuleView> {
        self.check_key(key)?;
        let rule_name = key.physical_name();
        rule.name = rule_name.clone();
        rule.target_tags = key.scope().network_tags(&key.alias);
        tracing::debug!(
            host_project = %key.host_project,
            service_project = %key.service_project,
            application = %key.application,
            %rule_name,
            "creating firewall rule"
        );
        self.store.insert_rule(&key.host_project, rule).await?;
        let stored = self.store.get_rule(&key.host_project, &rule_name).await?;
        self.single(key, stored)
    }

    pub async fn delete(&self, key: &LogicalRuleKey) -> CatalogResult<()> {
        self.check_key(key)?;
        let rule_name = key.physical_name();
        tracing::debug!(
            host_project = %key.host_project,
            service_project = %key.service_project,
            application = %key.application,
            %rule_name,
            "deleting firewall rule"
        );
        self.store.delete_rule(&key.host_project, &rule_name).await?;
        Ok(())
    }

    /// Under [`NamingPolicy::Strict`] a name whose remainder is not a valid
    /// alias belongs to a longer service project or application.
    fn in_scope(&self, scope: &RuleScope, physical: &str) -> bool {
        scope
            .alias_of(physical)
            .is_ok_and(|alias| self.naming.check_alias(alias).is_ok())
    }

    fn check_key(&self, key: &LogicalRuleKey) -> CatalogResult<()> {
        self.naming.check_application(&key.application)?;
        self.naming.check_alias(&key.alias)?;
        Ok(())
    }

    fn single(
        &self,
        key: &LogicalRuleKey,
        rule: FirewallRule,
    ) -> CatalogResult<ApplicationRuleView> {
        let scope = key.scope();
        let entry = entry(&scope, rule)?;
        Ok(view(&key.host_project, &scope, vec![entry]))
    }
}

fn entry(scope: &RuleScope, rule: FirewallRule) -> CatalogResult<RuleEntry> {
    let alias = scope.alias_of(&rule.name).map_err(|err| {
        tracing::error!(error = %err, "provider returned a rule outside the requested scope");
        err
    })?;
    Ok(RuleEntry {
        alias: alias.to_string(),
        rule,
    })
}

fn view(
    host_project: &ProjectId,
    scope: &RuleScope,
    rules: Vec<RuleEntry>,
) -> ApplicationRuleView {
    ApplicationRuleView {
        host_project: host_project.to_string(),
        service_project: scope.service_project.to_string(),
        application: scope.application.clone(),
        rules,
    }
}
