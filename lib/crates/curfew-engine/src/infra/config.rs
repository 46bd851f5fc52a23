//! Loads the engine configuration from YAML on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::config::EngineConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CURFEW_CONFIG";

/// `~/.curfew`, home of the config, the policy document and the audit log.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn curfew_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".curfew"))
}

/// Config file path: `$CURFEW_CONFIG` or `~/.curfew/config.yaml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(val) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(val));
    }
    Ok(curfew_dir()?.join("config.yaml"))
}

/// YAML-file backed configuration source.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// Store at the default location (see [`config_path`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(config_path()?))
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load and validate. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(&self) -> Result<EngineConfig> {
        let config = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("cannot read {}", self.path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse {}", self.path.display()))?
        } else {
            EngineConfig::default()
        };
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", self.path.display()))?;
        Ok(config)
    }
}

/// Policy document path, falling back to `~/.curfew/policy.json`.
///
/// # Errors
///
/// Returns an error if the default is needed and the home directory cannot
/// be determined.
pub fn state_path(config: &EngineConfig) -> Result<PathBuf> {
    match &config.state_path {
        Some(p) => Ok(p.clone()),
        None => Ok(curfew_dir()?.join("policy.json")),
    }
}

/// Audit log path, falling back to `~/.curfew/audit.jsonl`.
///
/// # Errors
///
/// Returns an error if the default is needed and the home directory cannot
/// be determined.
pub fn audit_path(config: &EngineConfig) -> Result<PathBuf> {
    match &config.audit_log {
        Some(p) => Ok(p.clone()),
        None => Ok(curfew_dir()?.join("audit.jsonl")),
    }
}
