use crate::catalog::naming::NamingPolicy;
use crate::model::FirewallRule;
use crate::store::gcp::{COMPUTE_ENDPOINT, RESOURCE_MANAGER_ENDPOINT};
use anyhow::{Context, Result, bail};
use firewall_authz::{GOOGLE_ISSUER, OWNER_ROLE, Policy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_PORT: &str = "8080";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    Gcp,
    /// Local runs and tests. Starts from `memory_seed` and loses every write on restart.
    Memory,
}

impl ProviderBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gcp" => Ok(Self::Gcp),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown provider backend {other:?} (expected gcp or memory)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpConfig {
    pub access_token: Option<String>,
    pub compute_endpoint: String,
    pub resource_manager_endpoint: String,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            compute_endpoint: COMPUTE_ENDPOINT.to_string(),
            resource_manager_endpoint: RESOURCE_MANAGER_ENDPOINT.to_string(),
        }
    }
}

/// Initial contents of the memory backend, keyed by project id.
///
/// Only read from the YAML override. Without it the memory backend starts
/// empty and every rule request is forbidden.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemorySeed {
    #[serde(default)]
    pub policies: BTreeMap<String, Policy>,
    /// Service project to host project.
    #[serde(default)]
    pub host_links: BTreeMap<String, String>,
    /// Host project to its firewall rules, stored as given.
    #[serde(default)]
    pub rules: BTreeMap<String, Vec<FirewallRule>>,
}

// Gateway configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct FirewallApiConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub provider: ProviderBackend,
    pub trusted_issuer: String,
    pub owner_role: String,
    pub naming: NamingPolicy,
    pub gcp: GcpConfig,
    pub memory_seed: MemorySeed,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FirewallApiConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    provider: Option<ProviderBackend>,
    trusted_issuer: Option<String>,
    owner_role: Option<String>,
    strict_names: Option<bool>,
    compute_endpoint: Option<String>,
    resource_manager_endpoint: Option<String>,
    memory_seed: Option<MemorySeed>,
}

impl FirewallApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("FIREWALL_API_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read FIREWALL_API_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = match lookup("FIREWALL_API_BIND") {
            Some(value) => value,
            None => format!(
                "0.0.0.0:{}",
                lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string())
            ),
        }
        .parse()
        .with_context(|| "parse FIREWALL_API_BIND")?;
        let metrics_bind = lookup("FIREWALL_API_METRICS_BIND")
            .unwrap_or_else(|| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse FIREWALL_API_METRICS_BIND")?;
        let provider = match lookup("FIREWALL_API_PROVIDER") {
            Some(value) => ProviderBackend::parse(&value)?,
            None => ProviderBackend::Gcp,
        };
        let strict_names = match lookup("FIREWALL_API_STRICT_NAMES") {
            Some(value) => {
                parse_flag(&value).with_context(|| "parse FIREWALL_API_STRICT_NAMES")?
            }
            None => false,
        };
        let defaults = GcpConfig::default();
        Ok(Self {
            bind_addr,
            metrics_bind,
            provider,
            trusted_issuer: lookup("FIREWALL_API_TRUSTED_ISSUER")
                .unwrap_or_else(|| GOOGLE_ISSUER.to_string()),
            owner_role: lookup("FIREWALL_API_OWNER_ROLE")
                .unwrap_or_else(|| OWNER_ROLE.to_string()),
            naming: NamingPolicy::from_strict_flag(strict_names),
            gcp: GcpConfig {
                access_token: lookup("GOOGLE_OAUTH_ACCESS_TOKEN")
                    .filter(|token| !token.is_empty()),
                compute_endpoint: lookup("FIREWALL_API_COMPUTE_ENDPOINT")
                    .unwrap_or(defaults.compute_endpoint),
                resource_manager_endpoint: lookup("FIREWALL_API_RESOURCE_MANAGER_ENDPOINT")
                    .unwrap_or(defaults.resource_manager_endpoint),
            },
            memory_seed: MemorySeed::default(),
        })
    }

    /// Apply a YAML override document on top of the current values.
    pub fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: FirewallApiConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse firewall api config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.provider {
            self.provider = value;
        }
        if let Some(value) = override_cfg.trusted_issuer {
            self.trusted_issuer = value;
        }
        if let Some(value) = override_cfg.owner_role {
            self.owner_role = value;
        }
        if let Some(value) = override_cfg.strict_names {
            self.naming = NamingPolicy::from_strict_flag(value);
        }
        if let Some(value) = override_cfg.compute_endpoint {
            self.gcp.compute_endpoint = value;
        }
        if let Some(value) = override_cfg.resource_manager_endpoint {
            self.gcp.resource_manager_endpoint = value;
        }
        if let Some(value) = override_cfg.memory_seed {
            self.memory_seed = value;
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("invalid boolean {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<FirewallApiConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        FirewallApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = from_vars(&[]).expect("config");
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.metrics_bind, "0.0.0.0:9090".parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.provider, ProviderBackend::Gcp);
        assert_eq!(config.trusted_issuer, GOOGLE_ISSUER);
        assert_eq!(config.owner_role, OWNER_ROLE);
        assert_eq!(config.naming, NamingPolicy::Lenient);
        assert_eq!(config.gcp, GcpConfig::default());
        assert_eq!(config.memory_seed, MemorySeed::default());
    }

    #[test]
    fn port_feeds_default_bind_and_explicit_bind_wins() {
        let config = from_vars(&[("PORT", "3000")]).expect("config");
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().expect("addr"));

        let config = from_vars(&[("PORT", "3000"), ("FIREWALL_API_BIND", "127.0.0.1:4000")])
            .expect("config");
        assert_eq!(config.bind_addr, "127.0.0.1:4000".parse::<SocketAddr>().expect("addr"));
    }

    #[test]
    fn reads_every_variable() {
        let config = from_vars(&[
            ("FIREWALL_API_METRICS_BIND", "127.0.0.1:9191"),
            ("FIREWALL_API_PROVIDER", "Memory"),
            ("FIREWALL_API_TRUSTED_ISSUER", "https://issuer.example"),
            ("FIREWALL_API_OWNER_ROLE", "roles/compute.securityAdmin"),
            ("FIREWALL_API_STRICT_NAMES", "true"),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.token"),
            ("FIREWALL_API_COMPUTE_ENDPOINT", "http://127.0.0.1:1"),
            ("FIREWALL_API_RESOURCE_MANAGER_ENDPOINT", "http://127.0.0.1:2"),
        ])
        .expect("config");
        assert_eq!(config.metrics_bind, "127.0.0.1:9191".parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.provider, ProviderBackend::Memory);
        assert_eq!(config.trusted_issuer, "https://issuer.example");
        assert_eq!(config.owner_role, "roles/compute.securityAdmin");
        assert_eq!(config.naming, NamingPolicy::Strict);
        assert_eq!(config.gcp.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.gcp.compute_endpoint, "http://127.0.0.1:1");
        assert_eq!(config.gcp.resource_manager_endpoint, "http://127.0.0.1:2");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(from_vars(&[("FIREWALL_API_BIND", "not-an-addr")]).is_err());
        assert!(from_vars(&[("FIREWALL_API_PROVIDER", "aws")]).is_err());
        assert!(from_vars(&[("FIREWALL_API_STRICT_NAMES", "maybe")]).is_err());
    }

    #[test]
    fn empty_access_token_is_ignored() {
        let config = from_vars(&[("GOOGLE_OAUTH_ACCESS_TOKEN", "")]).expect("config");
        assert_eq!(config.gcp.access_token, None);
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let mut config = from_vars(&[]).expect("config");
        config
            .apply_yaml(
                "bind_addr: 127.0.0.1:7000\nprovider: memory\nstrict_names: true\ncompute_endpoint: http://compute.local\n",
            )
            .expect("apply yaml");
        assert_eq!(config.bind_addr, "127.0.0.1:7000".parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.provider, ProviderBackend::Memory);
        assert_eq!(config.naming, NamingPolicy::Strict);
        assert_eq!(config.gcp.compute_endpoint, "http://compute.local");
        assert_eq!(config.owner_role, OWNER_ROLE);

        assert!(config.apply_yaml("unknown_key: 1\n").is_err());
        assert!(config.apply_yaml("metrics_bind: nope\n").is_err());
    }

    #[test]
    fn yaml_seeds_memory_backend() {
        let mut config = from_vars(&[]).expect("config");
        config
            .apply_yaml(
                r#"
provider: memory
memory_seed:
  policies:
    tenant1:
      bindings:
        - role: roles/owner
          members: ["user:owner@example.com"]
        - role: roles/viewer
          members: ["user:viewer@example.com"]
  host_links:
    tenant1: shared-vpc-host
  rules:
    shared-vpc-host:
      - name: tenant1-web-ssh
        direction: INGRESS
"#,
            )
            .expect("apply yaml");
        let seed = &config.memory_seed;
        assert!(seed.policies["tenant1"].grants(OWNER_ROLE, "user:owner@example.com"));
        assert_eq!(seed.policies["tenant1"].bindings.len(), 2);
        assert_eq!(seed.host_links["tenant1"], "shared-vpc-host");
        let rule = &seed.rules["shared-vpc-host"][0];
        assert_eq!(rule.name, "tenant1-web-ssh");
        assert_eq!(rule.field("direction"), Some(&serde_json::json!("INGRESS")));

        assert!(
            config
                .apply_yaml("memory_seed:\n  tenants: {}\n")
                .is_err()
        );
    }

    #[test]
    #[serial]
    fn from_env_or_yaml_reads_config_file() {
        let path = std::env::temp_dir().join(format!("firewall-api-{}.yaml", std::process::id()));
        fs::write(&path, "owner_role: roles/editor\n").expect("write yaml");
        let previous = std::env::var("FIREWALL_API_CONFIG").ok();
        unsafe {
            std::env::set_var("FIREWALL_API_CONFIG", &path);
        }

        let result = FirewallApiConfig::from_env_or_yaml();

        unsafe {
            match previous {
                Some(value) => std::env::set_var("FIREWALL_API_CONFIG", value),
                None => std::env::remove_var("FIREWALL_API_CONFIG"),
            }
        }
        let _ = fs::remove_file(&path);
        assert_eq!(result.expect("config").owner_role, "roles/editor");
    }
}
