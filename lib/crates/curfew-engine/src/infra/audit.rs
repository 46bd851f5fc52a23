//! Audit sinks: a JSON-lines file, one `ReconciliationResult` per line.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use curfew_common::{BackendOutcome, ReconciliationResult};
use tracing::{info, warn};

use crate::application::ports::AuditSink;

pub struct JsonlAuditSink {
    path: PathBuf,
}

impl JsonlAuditSink {
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening audit log {}", path.display()))?;
    writeln!(file, "{line}").with_context(|| format!("appending to {}", path.display()))
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, result: &ReconciliationResult) -> Result<()> {
        match &result.outcome {
            BackendOutcome::Failed { reason, permanent } => warn!(
                target: "curfew::audit",
                backend = %result.backend,
                revision = result.revision,
                permanent,
                reason = %reason,
                "backend failed"
            ),
            outcome => info!(
                target: "curfew::audit",
                backend = %result.backend,
                revision = result.revision,
                outcome = ?outcome,
                verified = ?result.verified,
                "backend reconciled"
            ),
        }
        let line = serde_json::to_string(result).context("serializing audit entry")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .context("audit task panicked")?
    }
}
