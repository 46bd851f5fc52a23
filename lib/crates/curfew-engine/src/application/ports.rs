//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `curfew_common`, never
//! from `crate::infra`.
//!
//! All ports are object-safe (`async_trait`, `Send + Sync`) because the
//! reconciler holds heterogeneous backends in one list and runs them on a
//! background task.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use curfew_common::{DomainGroup, Policy, ReconciliationResult};
use serde::{Deserialize, Serialize};

use crate::domain::{BackendError, EnforcementArtifact};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Everything the policy store persists: the restriction state and the
/// user-defined catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub custom_groups: Vec<DomainGroup>,
}

// ── Enforcement Port ──────────────────────────────────────────────────────────

/// One enforcement mechanism (proxy ACL, hosts file, firewall, PAC).
#[async_trait]
pub trait EnforcementBackend: Send + Sync {
    /// Stable name used in results, logs and the committed-digest table.
    fn name(&self) -> &str;

    /// Render the artifact for a policy and its resolved domain set. Pure.
    fn render(&self, policy: &Policy, domains: &[String]) -> EnforcementArtifact;

    /// Make the live state match `artifact`. Safe to call repeatedly with the
    /// same artifact.
    ///
    /// # Errors
    ///
    /// `Transient` for failures worth retrying, `Permanent` for missing
    /// privilege and similar.
    async fn apply(&self, artifact: &EnforcementArtifact) -> Result<(), BackendError>;

    /// Read the live state back and compare it to the last artifact this
    /// backend applied. `false` when nothing was applied yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the live state cannot be read at all.
    async fn verify(&self) -> Result<bool, BackendError>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so backends can be tested without spawning
/// `systemctl` or `nft`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program with the runner's default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── State Ports ───────────────────────────────────────────────────────────────

/// Durable storage for the [`PolicyDocument`].
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Load the stored document, `None` on first run.
    async fn load(&self) -> Result<Option<PolicyDocument>>;
    /// Replace the stored document. Must be atomic: after a failure the
    /// previous document is still readable.
    async fn save(&self, document: &PolicyDocument) -> Result<()>;
}

/// Append-only record of per-backend reconciliation outcomes.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, result: &ReconciliationResult) -> Result<()>;
}
