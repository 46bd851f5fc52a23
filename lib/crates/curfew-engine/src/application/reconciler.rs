//! Background reconciliation worker.
//!
//! One tokio task owns every backend. Triggers go through a single
//! [`Notify`] permit: any number of requests arriving while a pass is in
//! flight collapse into exactly one follow-up pass, which reads the latest
//! policy. Each request gets a ticket (monotonic sequence number); a pass
//! covers every ticket issued before it read the policy.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use curfew_common::{
    BackendOutcome, Phase, Policy, ReconcileReport, ReconciliationResult, WaitStatus,
};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::ports::{AuditSink, EnforcementBackend};
use crate::application::store::PolicyStore;
use crate::domain::EnforcementArtifact;

/// Retry schedule for passes that did not commit.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl RetryPolicy {
    fn next(&self, previous: Option<Duration>) -> Duration {
        match previous {
            None => self.initial,
            Some(d) => d.saturating_mul(2).min(self.max),
        }
    }
}

#[derive(Debug, Clone)]
struct Published {
    /// Highest ticket this pass covers.
    covered: u64,
    report: ReconcileReport,
}

struct Shared {
    store: Arc<PolicyStore>,
    backends: Vec<Arc<dyn EnforcementBackend>>,
    audit: Arc<dyn AuditSink>,
    retry: RetryPolicy,
    trigger: Notify,
    tickets: AtomicU64,
    passes: AtomicU64,
    degraded: AtomicBool,
    closing: AtomicBool,
    phase: watch::Sender<Phase>,
    reports: watch::Sender<Option<Published>>,
}

/// Handle to the reconciliation worker. Cheap to clone.
#[derive(Clone)]
pub struct Reconciler {
    shared: Arc<Shared>,
}

impl Reconciler {
    /// Start the worker. Nothing runs until the first [`request`](Self::request).
    #[must_use]
    pub fn spawn(
        store: Arc<PolicyStore>,
        backends: Vec<Arc<dyn EnforcementBackend>>,
        audit: Arc<dyn AuditSink>,
        retry: RetryPolicy,
    ) -> (Self, JoinHandle<()>) {
        let (phase, _) = watch::channel(Phase::Pending);
        let (reports, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            store,
            backends,
            audit,
            retry,
            trigger: Notify::new(),
            tickets: AtomicU64::new(0),
            passes: AtomicU64::new(0),
            degraded: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            phase,
            reports,
        });
        let worker = Arc::clone(&shared);
        let handle = tokio::spawn(async move { worker.run().await });
        (Self { shared }, handle)
    }

    /// Ask for a pass and return the ticket to wait on.
    pub fn request(&self) -> u64 {
        let ticket = self.shared.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.trigger.notify_one();
        debug!(ticket, "reconciliation requested");
        ticket
    }

    /// Wait until a pass covering `ticket` has finished, or `timeout` elapses.
    /// On timeout the pass keeps running; poll [`last_report`](Self::last_report).
    pub async fn wait(&self, ticket: u64, timeout: Duration) -> WaitStatus {
        let mut rx = self.shared.reports.subscribe();
        let covered = async {
            loop {
                let found = rx
                    .borrow_and_update()
                    .as_ref()
                    .filter(|p| p.covered >= ticket)
                    .map(|p| p.report.clone());
                if found.is_some() {
                    return found;
                }
                if rx.changed().await.is_err() {
                    return None;
                }
            }
        };
        match tokio::time::timeout(timeout, covered).await {
            Ok(Some(report)) => WaitStatus::Completed(report),
            Ok(None) | Err(_) => WaitStatus::Timeout { ticket },
        }
    }

    #[must_use]
    pub fn last_report(&self) -> Option<ReconcileReport> {
        self.shared
            .reports
            .borrow()
            .as_ref()
            .map(|p| p.report.clone())
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.shared.phase.borrow()
    }

    /// The last pass ended with a failure that will not be retried
    /// automatically.
    #[must_use]
    pub fn degraded(&self) -> bool {
        self.shared.degraded.load(Ordering::SeqCst)
    }

    /// What `backend` would apply for the current policy. Nothing is written.
    pub async fn preview(&self, backend: &str) -> Option<EnforcementArtifact> {
        let backend = self.shared.backends.iter().find(|b| b.name() == backend)?;
        let (policy, catalog) = self.shared.store.snapshot().await;
        let (domains, _) = catalog.resolve_lenient(&policy.restricted_groups);
        Some(backend.render(&policy, &domains))
    }

    #[must_use]
    pub fn backend_names(&self) -> Vec<String> {
        self.shared
            .backends
            .iter()
            .map(|b| b.name().to_string())
            .collect()
    }

    /// Let the worker exit once the current pass (if any) is done.
    pub fn shutdown(&self) {
        self.shared.closing.store(true, Ordering::SeqCst);
        self.shared.trigger.notify_one();
    }
}

impl Shared {
    async fn run(self: Arc<Self>) {
        let mut committed: HashMap<String, String> = HashMap::new();
        let mut retry_in: Option<Duration> = None;
        loop {
            match retry_in {
                Some(delay) => {
                    tokio::select! {
                        () = self.trigger.notified() => {}
                        () = tokio::time::sleep(delay) => {
                            info!(delay_secs = delay.as_secs(), "retrying reconciliation");
                        }
                    }
                }
                None => self.trigger.notified().await,
            }
            if self.closing.load(Ordering::SeqCst) {
                debug!("reconciler stopped");
                return;
            }

            let report = self.run_pass(&mut committed).await;
            retry_in = if report.is_committed() || report.has_permanent_failure() {
                None
            } else {
                Some(self.retry.next(retry_in))
            };
        }
    }

    async fn run_pass(&self, committed: &mut HashMap<String, String>) -> ReconcileReport {
        let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
        let covered = self.tickets.load(Ordering::SeqCst);
        let started_at = Utc::now();

        self.phase.send_replace(Phase::Rendering);
        let (policy, domains, dropped_groups) = self.resolve().await;
        let revision = policy.revision;
        info!(pass, revision, domains = domains.len(), "reconciliation started");

        let artifacts: Vec<EnforcementArtifact> = self
            .backends
            .iter()
            .map(|b| b.render(&policy, &domains))
            .collect();

        self.phase.send_replace(Phase::Applying);
        let mut results = Vec::with_capacity(self.backends.len());
        let mut failed = false;
        for (backend, artifact) in self.backends.iter().zip(&artifacts) {
            let name = backend.name();
            if failed {
                results.push(result(revision, name, BackendOutcome::Deferred, None));
                continue;
            }
            let (outcome, verified) =
                apply_one(backend.as_ref(), artifact, committed.get(name)).await;
            failed = !outcome.is_success();
            results.push(result(revision, name, outcome, verified));
        }

        let mut drift_detected = false;
        if !failed {
            self.phase.send_replace(Phase::Verifying);
            for (backend, entry) in self.backends.iter().zip(results.iter_mut()) {
                if entry.outcome != BackendOutcome::Applied {
                    continue;
                }
                let verified = match backend.verify().await {
                    Ok(ok) => ok,
                    Err(e) => {
                        warn!(backend = backend.name(), error = %e, "verification failed");
                        false
                    }
                };
                if !verified {
                    warn!(backend = backend.name(), revision, "live state does not match applied artifact");
                    drift_detected = true;
                }
                entry.verified = Some(verified);
            }
        }

        let phase = if failed || drift_detected {
            // Anything written this pass no longer matches its committed
            // digest, so it must not be skipped next time.
            for entry in &results {
                if matches!(entry.outcome, BackendOutcome::Applied | BackendOutcome::Failed { .. }) {
                    committed.remove(&entry.backend);
                }
            }
            Phase::RolledBack
        } else {
            for (backend, artifact) in self.backends.iter().zip(&artifacts) {
                committed.insert(backend.name().to_string(), artifact.digest());
            }
            Phase::Committed
        };

        for entry in &results {
            if let Err(e) = self.audit.record(entry).await {
                warn!(backend = %entry.backend, error = %e, "failed to record audit entry");
            }
        }

        let report = ReconcileReport {
            pass,
            revision,
            phase,
            results,
            drift_detected,
            dropped_groups,
            stale: self.tickets.load(Ordering::SeqCst) > covered,
            started_at,
            finished_at: Utc::now(),
        };
        self.degraded
            .store(report.has_permanent_failure(), Ordering::SeqCst);
        self.phase.send_replace(phase);
        info!(pass, revision, %phase, stale = report.stale, "reconciliation finished");
        self.reports.send_replace(Some(Published {
            covered,
            report: report.clone(),
        }));
        report
    }

    /// Current policy and its domain set. Unknown restricted groups are
    /// logged, returned, and pruned from the store.
    async fn resolve(&self) -> (Policy, Vec<String>, Vec<String>) {
        let (policy, catalog) = self.store.snapshot().await;
        let (domains, dropped) = catalog.resolve_lenient(&policy.restricted_groups);
        if dropped.is_empty() {
            return (policy, domains, dropped);
        }

        warn!(groups = ?dropped, "restricted apps no longer exist; dropping them");
        if let Err(e) = self.store.prune_groups(&dropped).await {
            warn!(error = %e, "failed to prune stale apps from policy");
            return (policy, domains, dropped);
        }
        let (policy, catalog) = self.store.snapshot().await;
        let (domains, _) = catalog.resolve_lenient(&policy.restricted_groups);
        (policy, domains, dropped)
    }
}

/// Skip when unchanged since the last commit and still live, otherwise apply.
async fn apply_one(
    backend: &dyn EnforcementBackend,
    artifact: &EnforcementArtifact,
    committed_digest: Option<&String>,
) -> (BackendOutcome, Option<bool>) {
    let name = backend.name();
    if committed_digest.is_some_and(|d| *d == artifact.digest()) {
        match backend.verify().await {
            Ok(true) => {
                debug!(backend = name, "artifact unchanged; skipping");
                return (BackendOutcome::Skipped, Some(true));
            }
            Ok(false) => info!(backend = name, "live state drifted; reapplying"),
            Err(e) => warn!(backend = name, error = %e, "could not read live state; reapplying"),
        }
    }
    match backend.apply(artifact).await {
        Ok(()) => {
            info!(backend = name, revision = artifact.revision, "artifact applied");
            (BackendOutcome::Applied, None)
        }
        Err(e) => {
            warn!(backend = name, error = %e, permanent = e.is_permanent(), "apply failed");
            (
                BackendOutcome::Failed {
                    reason: e.to_string(),
                    permanent: e.is_permanent(),
                },
                None,
            )
        }
    }
}

fn result(
    revision: u64,
    backend: &str,
    outcome: BackendOutcome,
    verified: Option<bool>,
) -> ReconciliationResult {
    ReconciliationResult {
        revision,
        backend: backend.to_string(),
        outcome,
        verified,
        timestamp: Utc::now(),
    }
}
