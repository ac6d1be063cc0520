//! Strongly typed identifiers used by the authorization checks.
//!
//! # Key invariants
//! - [`ProjectId`] preserves the provider's project identifier exactly; it is
//!   compared byte-for-byte against host links.
//! - [`Identity`] only comes out of a successful token decode.
use serde::{Deserialize, Serialize};

/// Cloud project identifier wrapper.
///
/// # Example
/// ```rust
/// use firewall_authz::ProjectId;
///
/// let project = ProjectId::new("shared-vpc-host");
/// assert_eq!(project.as_str(), "shared-vpc-host");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller identity extracted from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

impl Identity {
    /// Policy member string for this identity (`user:<email>`).
    pub fn policy_member(&self) -> String {
        format!("user:{}", self.email)
    }
}
