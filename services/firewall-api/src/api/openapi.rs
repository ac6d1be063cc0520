//! OpenAPI schema aggregation for the gateway API.
//!
//! # Purpose
//! Collects the rule routes and schema types into a single OpenAPI document
//! served at `/openapi.json`.
use crate::api::{
    rules, system,
    types::{ErrorResponse, HealthStatus},
};
use crate::model::{ApplicationRuleView, FirewallRule, RuleEntry};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "firewall-api",
        version = "v1",
        description = "Shared VPC firewall rule gateway"
    ),
    paths(
        system::health,
        rules::list_rules,
        rules::get_rule,
        rules::create_rule,
        rules::delete_rule
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        FirewallRule,
        RuleEntry,
        ApplicationRuleView
    )),
    tags(
        (name = "system", description = "Liveness and discovery endpoints"),
        (name = "firewall_rules", description = "Firewall rules of a tenant application")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert!(paths.contains(&"/_health"));
        assert!(paths.contains(
            &"/project/{project}/service_project/{service_project}/application/{application}"
        ));
        let rule_path = "/project/{project}/service_project/{service_project}/application/{application}/firewall_rule/{rule}";
        let item = doc.paths.paths.get(rule_path).expect("rule path");
        assert!(item.operations.len() >= 3);
    }
}
