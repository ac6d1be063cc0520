//! Provider seams consumed by the verifiers.
//!
//! Implementations live in the service crate (cloud REST clients, in-memory
//! fakes). Everything here is shaped after the provider JSON so clients can
//! deserialize straight into it.
use crate::{ProjectId, ProviderError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Policy {
    /// True when a binding for exactly `role` lists exactly `member`.
    pub fn grants(&self, role: &str, member: &str) -> bool {
        self.bindings
            .iter()
            .filter(|binding| binding.role == role)
            .any(|binding| binding.members.iter().any(|candidate| candidate == member))
    }
}

/// Host project a service project is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLink {
    pub name: String,
}

#[async_trait]
pub trait PolicyProvider: Send + Sync {
    async fn get_policy(&self, project: &ProjectId) -> Result<Policy, ProviderError>;
}

#[async_trait]
pub trait HostLinkProvider: Send + Sync {
    /// `Ok(None)` when no host project is registered for `project`.
    async fn get_host_link(&self, project: &ProjectId) -> Result<Option<HostLink>, ProviderError>;
}
