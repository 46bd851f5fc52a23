//! Shared fakes: backends, command runner, repository and audit sink.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::process::{ExitStatus, Output};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use curfew_common::{Policy, ReconciliationResult};
use curfew_engine::application::ports::{
    AuditSink, CommandRunner, EnforcementBackend, PolicyDocument, PolicyRepository,
};
use curfew_engine::application::{PolicyService, PolicyStore, Reconciler, RetryPolicy};
use curfew_engine::domain::{ArtifactBody, BackendError, EnforcementArtifact, FileArtifact};
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;

// ── Output constructors ──────────────────────────────────────────────────────

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Fake: enforcement backend ────────────────────────────────────────────────

/// In-memory backend. "Live state" is the digest of the last applied artifact.
pub struct FakeBackend {
    name: String,
    live: Mutex<Option<String>>,
    applied: Mutex<Vec<EnforcementArtifact>>,
    failure: Mutex<Option<BackendError>>,
    fail_times: AtomicUsize,
    lose_writes: AtomicBool,
    gate: Option<Arc<Semaphore>>,
    pub entered: Notify,
}

impl FakeBackend {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, None))
    }

    /// Every `apply` blocks until the test adds a permit to `gate`.
    pub fn gated(name: &str, gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self::build(name, Some(gate)))
    }

    fn build(name: &str, gate: Option<Arc<Semaphore>>) -> Self {
        Self {
            name: name.to_string(),
            live: Mutex::new(None),
            applied: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            fail_times: AtomicUsize::new(0),
            lose_writes: AtomicBool::new(false),
            gate,
            entered: Notify::new(),
        }
    }

    /// Fail the next `times` applies with `error`.
    pub fn fail_next(&self, times: usize, error: BackendError) {
        *self.failure.lock().unwrap() = Some(error);
        self.fail_times.store(times, Ordering::SeqCst);
    }

    /// Applies succeed but the live state never changes.
    pub fn lose_writes(&self, lose: bool) {
        self.lose_writes.store(lose, Ordering::SeqCst);
    }

    /// Simulate an out-of-band change to the live state.
    pub fn tamper(&self) {
        *self.live.lock().unwrap() = Some("tampered".to_string());
    }

    pub fn applies(&self) -> usize {
        self.applied.lock().unwrap().len()
    }

    pub fn last_applied(&self) -> Option<EnforcementArtifact> {
        self.applied.lock().unwrap().last().cloned()
    }

    /// Content of the single file in the last applied artifact.
    pub fn last_content(&self) -> Option<String> {
        match self.last_applied()?.body {
            ArtifactBody::Files { files } => files.first().map(|f| f.content.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl EnforcementBackend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, policy: &Policy, domains: &[String]) -> EnforcementArtifact {
        EnforcementArtifact {
            backend: self.name.clone(),
            revision: policy.revision,
            body: ArtifactBody::Files {
                files: vec![FileArtifact {
                    path: self.name.clone().into(),
                    content: format!("internet_blocked={} domains={}", policy.internet_blocked, domains.join(",")),
                }],
            },
        }
    }

    async fn apply(&self, artifact: &EnforcementArtifact) -> Result<(), BackendError> {
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        let remaining = self.fail_times.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_times.store(remaining - 1, Ordering::SeqCst);
            return Err(self.failure.lock().unwrap().clone().expect("failure set"));
        }
        self.applied.lock().unwrap().push(artifact.clone());
        if !self.lose_writes.load(Ordering::SeqCst) {
            *self.live.lock().unwrap() = Some(artifact.digest());
        }
        Ok(())
    }

    async fn verify(&self) -> Result<bool, BackendError> {
        let expected = self.applied.lock().unwrap().last().map(EnforcementArtifact::digest);
        let live = self.live.lock().unwrap().clone();
        Ok(expected.is_some() && expected == live)
    }
}

// ── Fake: command runner ─────────────────────────────────────────────────────

/// Records every argv and replays queued outputs (default: success, no output).
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: Mutex<Vec<Vec<String>>>,
    outputs: Mutex<VecDeque<Output>>,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_output(&self, output: Output) {
        self.outputs.lock().unwrap().push_back(output);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(30)).await
    }

    async fn run_with_timeout(&self, program: &str, args: &[&str], _: Duration) -> Result<Output> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().map(|a| (*a).to_string()));
        self.calls.lock().unwrap().push(argv);
        Ok(self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok_output(b"")))
    }
}

// ── Fake: repository ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRepository {
    document: Mutex<Option<PolicyDocument>>,
    pub fail_saves: AtomicBool,
    pub saves: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_document(document: PolicyDocument) -> Arc<Self> {
        let repo = Self::default();
        *repo.document.lock().unwrap() = Some(document);
        Arc::new(repo)
    }

    pub fn stored(&self) -> Option<PolicyDocument> {
        self.document.lock().unwrap().clone()
    }
}

#[async_trait]
impl PolicyRepository for InMemoryRepository {
    async fn load(&self) -> Result<Option<PolicyDocument>> {
        Ok(self.stored())
    }

    async fn save(&self, document: &PolicyDocument) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.document.lock().unwrap() = Some(document.clone());
        Ok(())
    }
}

// ── Fake: audit sink ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingAudit {
    pub entries: Mutex<Vec<ReconciliationResult>>,
}

impl RecordingAudit {
    pub fn entries(&self) -> Vec<ReconciliationResult> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record(&self, result: &ReconciliationResult) -> Result<()> {
        self.entries.lock().unwrap().push(result.clone());
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub const WAIT: Duration = Duration::from_secs(10);

/// A started engine wired to fakes. Retries are effectively disabled unless
/// `retry` is given.
pub struct Harness {
    pub service: PolicyService,
    pub store: Arc<PolicyStore>,
    pub repo: Arc<InMemoryRepository>,
    pub audit: Arc<RecordingAudit>,
    pub worker: JoinHandle<()>,
}

pub async fn harness(backends: &[Arc<FakeBackend>]) -> Harness {
    harness_with(InMemoryRepository::new(), backends, None).await
}

pub async fn harness_with(
    repo: Arc<InMemoryRepository>,
    backends: &[Arc<FakeBackend>],
    retry: Option<RetryPolicy>,
) -> Harness {
    let store = Arc::new(
        PolicyStore::open(Arc::clone(&repo) as Arc<dyn PolicyRepository>)
            .await
            .expect("open store"),
    );
    let audit = Arc::new(RecordingAudit::default());
    let backends: Vec<Arc<dyn EnforcementBackend>> = backends
        .iter()
        .map(|b| Arc::clone(b) as Arc<dyn EnforcementBackend>)
        .collect();
    let retry = retry.unwrap_or(RetryPolicy {
        initial: Duration::from_secs(3600),
        max: Duration::from_secs(3600),
    });
    let (reconciler, worker) = Reconciler::spawn(
        Arc::clone(&store),
        backends,
        Arc::clone(&audit) as Arc<dyn AuditSink>,
        retry,
    );
    Harness {
        service: PolicyService::new(Arc::clone(&store), reconciler, WAIT),
        store,
        repo,
        audit,
        worker,
    }
}
