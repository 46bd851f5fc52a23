//! Infrastructure layer: concrete implementations of the application ports.
//!
//! This module contains all I/O-performing code: process execution, file
//! replacement, persistence, the audit log and the enforcement backends.
//! Imports from `crate::domain` and `crate::application` are allowed.

pub mod atomic;
pub mod audit;
pub mod backends;
pub mod command_runner;
pub mod config;
pub mod repository;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::info;

use crate::application::ports::{AuditSink, CommandRunner, PolicyRepository};
use crate::application::{PolicyService, PolicyStore, Reconciler, RetryPolicy};
use crate::domain::EngineConfig;

use self::audit::JsonlAuditSink;
use self::command_runner::TokioCommandRunner;
use self::repository::JsonPolicyRepository;

/// A running engine: the use-case facade and its background worker.
pub struct Engine {
    pub service: PolicyService,
    pub worker: JoinHandle<()>,
}

impl Engine {
    /// Stop the worker after the pass in flight, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker task panicked.
    pub async fn shutdown(self) -> Result<()> {
        self.service.reconciler().shutdown();
        self.worker.await.context("reconciler task panicked")
    }
}

/// Wire the production adapters for `config` and start the worker.
///
/// # Errors
///
/// Returns an error if default paths cannot be determined or the stored
/// policy cannot be loaded.
pub async fn start(config: &EngineConfig) -> Result<Engine> {
    let state_path = config::state_path(config)?;
    let repo: Arc<dyn PolicyRepository> = Arc::new(JsonPolicyRepository::with_path(state_path.clone()));
    let store = Arc::new(
        PolicyStore::open(repo)
            .await
            .with_context(|| format!("opening policy store {}", state_path.display()))?,
    );

    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new(config.command_timeout()));
    let backends = backends::build(config, &runner);
    let audit: Arc<dyn AuditSink> = Arc::new(JsonlAuditSink::with_path(config::audit_path(config)?));

    info!(
        backends = ?backends.iter().map(|b| b.name().to_string()).collect::<Vec<_>>(),
        state = %state_path.display(),
        "engine started"
    );
    let (reconciler, worker) = Reconciler::spawn(
        Arc::clone(&store),
        backends,
        audit,
        RetryPolicy {
            initial: config.retry_backoff(),
            max: config.retry_backoff_max(),
        },
    );
    Ok(Engine {
        service: PolicyService::new(store, reconciler, config.wait_timeout()),
        worker,
    })
}
