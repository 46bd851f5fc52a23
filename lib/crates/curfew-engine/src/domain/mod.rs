//! Domain layer: catalog, policy transitions, rendering grammars and the
//! configuration schema.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs` or `std::process`. All functions are synchronous and
//! take data in, returning data out.

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod error;
pub mod policy;
pub mod render;

pub use artifact::{ArtifactBody, EnforcementArtifact, FileArtifact, FirewallRule};
pub use catalog::{BUILTIN_GROUPS, DomainCatalog, normalize_domains, normalize_name};
pub use config::{
    BackendConfig, EngineConfig, FirewallSettings, HostsFileSettings, PacSettings,
    ProxyAclSettings,
};
pub use error::{BackendError, CatalogError, ConfigError};
