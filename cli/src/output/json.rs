//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed document to
//! stdout. Failures use the error object from [`format_error`].

use anyhow::{Context, Result};
use curfew_common::{DomainGroup, GroupResponse, StatusResponse, WaitStatus};
use curfew_engine::domain::EnforcementArtifact;
use curfew_engine::{CatalogError, StoreError};
use serde::Serialize;

/// Format the JSON error object printed when a command fails.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for a command failure.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::Catalog(CatalogError::UnknownGroup(_))) => "unknown_app",
        Some(StoreError::Catalog(CatalogError::BuiltinGroup(_))) => "builtin_app",
        Some(StoreError::Catalog(_)) => "invalid_input",
        Some(StoreError::Persist(_)) => "persist_failed",
        None => "error",
    }
}

/// Renders command results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{out}");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        self.render(&serde_json::json!({ "version": version }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_apps(&self, apps: &[DomainGroup], status: &StatusResponse) -> Result<()> {
        let apps: Vec<_> = apps
            .iter()
            .map(|g| {
                serde_json::json!({
                    "name": g.name,
                    "domains": g.domains,
                    "custom": status.custom_apps.contains_key(&g.name),
                    "restricted": status.restricted.contains(&g.name),
                })
            })
            .collect();
        self.render(&serde_json::json!({ "apps": apps }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_group(
        &self,
        group: &DomainGroup,
        reconciliation: Option<&WaitStatus>,
    ) -> Result<()> {
        self.render(&GroupResponse {
            group: group.clone(),
            reconciliation: reconciliation.cloned(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_artifact(&self, artifact: &EnforcementArtifact) -> Result<()> {
        self.render(&serde_json::json!({
            "backend": artifact.backend,
            "revision": artifact.revision,
            "digest": artifact.digest(),
            "body": artifact.body,
        }))
    }
}
