use crate::catalog::naming::{self, RuleScope};
use firewall_authz::ProjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Provider firewall rule payload.
///
/// Only `name` and `targetTags` are interpreted here. Every other field
/// (`network`, `allowed`, `sourceRanges`, `id`, ...) is carried through
/// untouched in `extra`, so callers may send anything the provider accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_tags: Vec<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl FirewallRule {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Logical address of one rule: host project plus tenant scope plus alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalRuleKey {
    pub host_project: ProjectId,
    pub service_project: ProjectId,
    pub application: String,
    pub alias: String,
}

impl LogicalRuleKey {
    pub fn scope(&self) -> RuleScope {
        RuleScope::new(self.service_project.clone(), self.application.clone())
    }

    pub fn physical_name(&self) -> String {
        naming::to_physical(
            self.service_project.as_str(),
            &self.application,
            &self.alias,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_round_trip_through_extra() {
        let payload = json!({
            "name": "svc-app-web",
            "network": "global/networks/shared",
            "direction": "INGRESS",
            "allowed": [{"IPProtocol": "tcp", "ports": ["443"]}],
            "targetTags": ["svc-app-web"]
        });
        let rule: FirewallRule = serde_json::from_value(payload.clone()).expect("rule");
        assert_eq!(rule.name, "svc-app-web");
        assert_eq!(rule.target_tags, vec!["svc-app-web".to_string()]);
        assert_eq!(rule.field("direction"), Some(&json!("INGRESS")));
        assert!(rule.field("name").is_none());

        assert_eq!(serde_json::to_value(&rule).expect("serialize"), payload);
    }

    #[test]
    fn logical_key_maps_to_physical_name() {
        let key = LogicalRuleKey {
            host_project: ProjectId::new("host"),
            service_project: ProjectId::new("svc"),
            application: "app".to_string(),
            alias: "web".to_string(),
        };
        assert_eq!(key.physical_name(), "svc-app-web");
        assert_eq!(key.scope().alias_of(&key.physical_name()), Ok("web"));
    }

    #[test]
    fn missing_name_and_tags_default_to_empty() {
        let rule: FirewallRule =
            serde_json::from_value(json!({"priority": 1000})).expect("rule");
        assert!(rule.name.is_empty());
        assert!(rule.target_tags.is_empty());
        assert_eq!(
            serde_json::to_value(&rule).expect("serialize"),
            json!({"name": "", "priority": 1000})
        );
    }
}
