//! Mapping between logical rule addresses and physical provider names.
//!
//! # Key invariants
//! - `physical = service_project + "-" + application + "-" + alias`; the same
//!   string is the only network target tag of a created rule.
//! - Mapping back strips the exact scope prefix and never guesses: a name
//!   without the prefix is a [`NameMismatch`].
//! - `alias_of(physical_name(alias)) == alias` for every alias.
//!
//! # Separator ambiguity
//! `("a-b", "c")` and `("a", "b-c")` share the prefix `a-b-c-`, so under
//! [`NamingPolicy::Lenient`] one application can see another's rules.
//! [`NamingPolicy::Strict`] rejects separators in applications and aliases,
//! which makes the last two segments of a physical name unambiguous.
use firewall_authz::ProjectId;
use thiserror::Error;

pub const SEPARATOR: char = '-';

/// Physical name of `alias` inside `service_project`/`application`.
pub fn to_physical(service_project: &str, application: &str, alias: &str) -> String {
    format!("{service_project}{SEPARATOR}{application}{SEPARATOR}{alias}")
}

/// Alias encoded in `physical`, or [`NameMismatch`] when the scope prefix is absent.
pub fn to_logical_alias<'a>(
    service_project: &str,
    application: &str,
    physical: &'a str,
) -> Result<&'a str, NameMismatch> {
    let prefix = scope_prefix(service_project, application);
    physical
        .strip_prefix(prefix.as_str())
        .ok_or_else(|| NameMismatch {
            physical_name: physical.to_string(),
            prefix,
        })
}

/// Network target tag set for a created rule.
pub fn network_tags(service_project: &str, application: &str, alias: &str) -> Vec<String> {
    vec![to_physical(service_project, application, alias)]
}

fn scope_prefix(service_project: &str, application: &str) -> String {
    format!("{service_project}{SEPARATOR}{application}{SEPARATOR}")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rule {physical_name} does not start with {prefix}")]
pub struct NameMismatch {
    pub physical_name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {value:?} must be non-empty and must not contain '-'")]
pub struct InvalidName {
    pub field: &'static str,
    pub value: String,
}

/// Tenant scope shared by every rule of one application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleScope {
    pub service_project: ProjectId,
    pub application: String,
}

impl RuleScope {
    pub fn new(service_project: ProjectId, application: impl Into<String>) -> Self {
        Self {
            service_project,
            application: application.into(),
        }
    }

    pub fn physical_name(&self, alias: &str) -> String {
        to_physical(self.service_project.as_str(), &self.application, alias)
    }

    pub fn network_tags(&self, alias: &str) -> Vec<String> {
        network_tags(self.service_project.as_str(), &self.application, alias)
    }

    pub fn alias_of<'a>(&self, physical: &'a str) -> Result<&'a str, NameMismatch> {
        to_logical_alias(self.service_project.as_str(), &self.application, physical)
    }
}

/// How application names and aliases are validated before mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// Accept any application and alias.
    #[default]
    Lenient,
    /// Reject empty segments and segments containing the separator.
    Strict,
}

impl NamingPolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }

    pub fn check_application(self, application: &str) -> Result<(), InvalidName> {
        self.check("application", application)
    }

    pub fn check_alias(self, alias: &str) -> Result<(), InvalidName> {
        self.check("rule", alias)
    }

    fn check(self, field: &'static str, value: &str) -> Result<(), InvalidName> {
        match self {
            Self::Lenient => Ok(()),
            Self::Strict if !value.is_empty() && !value.contains(SEPARATOR) => Ok(()),
            Self::Strict => Err(InvalidName {
                field,
                value: value.to_string(),
            }),
        }
    }
}
