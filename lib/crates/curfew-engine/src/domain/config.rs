//! Engine configuration schema and validation.
//!
//! Pure types only; loading from disk lives in `infra::config`.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.curfew/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy document; defaults to `~/.curfew/policy.json`.
    pub state_path: Option<PathBuf>,
    /// JSON-lines audit log; defaults to `~/.curfew/audit.jsonl`.
    pub audit_log: Option<PathBuf>,
    /// How long callers wait for a reconciliation before getting `timeout`.
    pub wait_timeout_secs: u64,
    /// Upper bound for each external command (reload, nft).
    pub command_timeout_secs: u64,
    /// First retry delay after a failed pass; doubles up to the max.
    pub retry_backoff_secs: u64,
    pub retry_backoff_max_secs: u64,
    /// Enforcement backends, applied in this order.
    pub backends: Vec<BackendConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            audit_log: None,
            wait_timeout_secs: 10,
            command_timeout_secs: 30,
            retry_backoff_secs: 5,
            retry_backoff_max_secs: 300,
            backends: vec![BackendConfig::ProxyAcl(ProxyAclSettings::default())],
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    #[must_use]
    pub fn retry_backoff_max(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_max_secs.max(self.retry_backoff_secs))
    }

    /// Validates the configuration as a whole.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backends.is_empty() {
            return Err(ConfigError::NoBackends);
        }
        for (key, value) in [
            ("wait_timeout_secs", self.wait_timeout_secs),
            ("command_timeout_secs", self.command_timeout_secs),
            ("retry_backoff_secs", self.retry_backoff_secs),
        ] {
            if value == 0 {
                return Err(invalid(key, "0"));
            }
        }
        let mut names: Vec<&str> = Vec::new();
        for backend in &self.backends {
            let name = backend.name();
            if name.trim().is_empty() {
                return Err(invalid("backends[].name", name));
            }
            if names.contains(&name) {
                return Err(ConfigError::DuplicateBackend(name.to_string()));
            }
            names.push(name);
            backend.validate()?;
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// One enforcement backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendConfig {
    ProxyAcl(ProxyAclSettings),
    HostsFile(HostsFileSettings),
    Firewall(FirewallSettings),
    Pac(PacSettings),
}

impl BackendConfig {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ProxyAcl(s) => &s.name,
            Self::HostsFile(s) => &s.name,
            Self::Firewall(s) => &s.name,
            Self::Pac(s) => &s.name,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::ProxyAcl(s) => {
                if s.reload_command.is_empty() {
                    return Err(invalid("reload_command", "[]"));
                }
                if s.http_port.trim().is_empty() {
                    return Err(invalid("http_port", &s.http_port));
                }
            }
            Self::HostsFile(s) => {
                if s.sink_address.parse::<IpAddr>().is_err() {
                    return Err(invalid("sink_address", &s.sink_address));
                }
            }
            Self::Firewall(s) => {
                let parts: Vec<&str> = s.table.split_whitespace().collect();
                let family_ok = matches!(
                    parts.first().copied(),
                    Some("inet" | "ip" | "ip6" | "bridge" | "netdev" | "arp")
                );
                if parts.len() != 2 || !family_ok {
                    return Err(invalid("table", &s.table));
                }
            }
            Self::Pac(s) => {
                if !s.blackhole_proxy.contains(':') {
                    return Err(invalid("blackhole_proxy", &s.blackhole_proxy));
                }
            }
        }
        Ok(())
    }
}

/// Squid forward proxy: ACL file + generated `squid.conf` + reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyAclSettings {
    pub name: String,
    pub acl_path: PathBuf,
    pub config_path: PathBuf,
    /// Value of the `http_port` directive.
    pub http_port: String,
    /// Value of the `access_log` directive.
    pub access_log: String,
    /// argv run after both files are in place.
    pub reload_command: Vec<String>,
}

impl Default for ProxyAclSettings {
    fn default() -> Self {
        Self {
            name: "squid".to_string(),
            acl_path: PathBuf::from("/etc/squid/blocked_domains.acl"),
            config_path: PathBuf::from("/etc/squid/squid.conf"),
            http_port: "3128 transparent".to_string(),
            access_log: "/var/log/squid/access.log squid".to_string(),
            reload_command: vec![
                "systemctl".to_string(),
                "reload".to_string(),
                "squid".to_string(),
            ],
        }
    }
}

/// Managed block inside the system hosts file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostsFileSettings {
    pub name: String,
    pub path: PathBuf,
    /// Address blocked names resolve to.
    pub sink_address: String,
    /// Also map `www.<domain>`.
    pub include_www: bool,
}

impl Default for HostsFileSettings {
    fn default() -> Self {
        Self {
            name: "hosts".to_string(),
            path: PathBuf::from("/etc/hosts"),
            sink_address: "0.0.0.0".to_string(),
            include_www: true,
        }
    }
}

/// Dedicated nftables table, replaced as a whole on every apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallSettings {
    pub name: String,
    /// `<family> <name>`, e.g. `inet curfew`.
    pub table: String,
    pub script_path: PathBuf,
    pub nft_binary: String,
}

impl Default for FirewallSettings {
    fn default() -> Self {
        Self {
            name: "firewall".to_string(),
            table: "inet curfew".to_string(),
            script_path: PathBuf::from("/etc/curfew/curfew.nft"),
            nft_binary: "nft".to_string(),
        }
    }
}

/// Proxy auto-config file served to browsers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacSettings {
    pub name: String,
    pub path: PathBuf,
    /// `host:port` of a proxy that refuses everything.
    pub blackhole_proxy: String,
}

impl Default for PacSettings {
    fn default() -> Self {
        Self {
            name: "pac".to_string(),
            path: PathBuf::from("/var/lib/curfew/proxy.pac"),
            blackhole_proxy: "127.0.0.1:9".to_string(),
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
