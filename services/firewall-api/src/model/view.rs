use crate::model::FirewallRule;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rules of one application as returned to callers.
///
/// Serialized as `{"project", "service_project", "application", "data"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationRuleView {
    #[serde(rename = "project")]
    pub host_project: String,
    pub service_project: String,
    pub application: String,
    #[serde(rename = "data")]
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RuleEntry {
    #[serde(rename = "item")]
    pub rule: FirewallRule,
    #[serde(rename = "custom_name")]
    pub alias: String,
}
