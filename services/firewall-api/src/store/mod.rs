//! Rule storage seam and the provider backends behind it.
//!
//! [`RuleStore`] is the provider's firewall collection for one host project.
//! Both backends also implement the policy and host-link traits from
//! `firewall_authz`, so one client instance serves the whole request path.
use crate::model::FirewallRule;
use async_trait::async_trait;
use firewall_authz::{ProjectId, ProviderError};
use thiserror::Error;

pub mod gcp;
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Every rule of `project`, in provider order.
    async fn list_rules(&self, project: &ProjectId) -> StoreResult<Vec<FirewallRule>>;
    async fn get_rule(&self, project: &ProjectId, name: &str) -> StoreResult<FirewallRule>;
    /// Insert `rule` as-is. An existing rule with the same name is a provider conflict.
    async fn insert_rule(&self, project: &ProjectId, rule: FirewallRule) -> StoreResult<()>;
    async fn delete_rule(&self, project: &ProjectId, name: &str) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
