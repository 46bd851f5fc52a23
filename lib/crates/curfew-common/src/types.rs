use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declarative restriction state. There is exactly one per deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Canonical names of the restricted app/site groups.
    #[serde(default)]
    pub restricted_groups: BTreeSet<String>,
    /// When set, every destination is blocked, not only the restricted groups.
    #[serde(default)]
    pub internet_blocked: bool,
    /// Bumped exactly once per state-changing mutation.
    #[serde(default)]
    pub revision: u64,
}

impl Policy {
    /// Whether the named group is currently restricted (exact canonical name).
    #[must_use]
    pub fn is_restricted(&self, group: &str) -> bool {
        self.restricted_groups.contains(group)
    }

    /// Whether the policy is the implicit initial state (ignoring revision).
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.restricted_groups.is_empty() && !self.internet_blocked
    }
}

/// A named app or site and the domains it is reachable on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainGroup {
    pub name: String,
    pub domains: Vec<String>,
    #[serde(default)]
    pub builtin: bool,
}

/// Outcome of one backend within one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackendOutcome {
    /// The artifact was written and the backend signalled.
    Applied,
    /// The artifact matched the last committed one and the live state still matched it.
    Skipped,
    /// Apply failed. `permanent` failures (missing privilege, etc.) are not retried automatically.
    Failed { reason: String, permanent: bool },
    /// Not attempted because an earlier backend failed in the same pass.
    Deferred,
}

impl BackendOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Applied | Self::Skipped)
    }

    #[must_use]
    pub fn is_permanent_failure(&self) -> bool {
        matches!(self, Self::Failed { permanent: true, .. })
    }
}

/// Per-backend record of a reconciliation attempt, appended to the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub revision: u64,
    pub backend: String,
    pub outcome: BackendOutcome,
    /// Result of the post-apply read-back; `None` when verification did not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    pub timestamp: DateTime<Utc>,
}

/// Reconciliation state machine phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Pending,
    Rendering,
    Applying,
    Verifying,
    Committed,
    RolledBack,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Rendering => "rendering",
            Self::Applying => "applying",
            Self::Verifying => "verifying",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Sequence number of the pass (1-based, per process).
    pub pass: u64,
    /// Policy revision the pass converged towards.
    pub revision: u64,
    /// Terminal phase: `Committed` or `RolledBack`.
    pub phase: Phase,
    pub results: Vec<ReconciliationResult>,
    #[serde(default)]
    pub drift_detected: bool,
    /// Restricted group names that no longer exist in the catalog.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_groups: Vec<String>,
    /// A newer trigger arrived while this pass was running.
    #[serde(default)]
    pub stale: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.phase == Phase::Committed
    }

    #[must_use]
    pub fn has_permanent_failure(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_permanent_failure())
    }

    #[must_use]
    pub fn result_for(&self, backend: &str) -> Option<&ReconciliationResult> {
        self.results.iter().find(|r| r.backend == backend)
    }
}
