//! Domain payloads shared by the catalog, the rule stores and the HTTP API.
mod rule;
mod view;

pub use rule::{FirewallRule, LogicalRuleKey};
pub use view::{ApplicationRuleView, RuleEntry};
