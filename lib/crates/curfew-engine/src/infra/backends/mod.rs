//! Enforcement backends and the helpers they share.

mod firewall;
mod hosts_file;
mod pac;
mod proxy_acl;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::ports::{CommandRunner, EnforcementBackend};
use crate::domain::{BackendConfig, BackendError, EngineConfig, EnforcementArtifact, FileArtifact};
use crate::infra::atomic::write_atomic;

pub use firewall::FirewallBackend;
pub use hosts_file::HostsFileBackend;
pub use pac::PacProxyBackend;
pub use proxy_acl::ProxyAclBackend;

/// Instantiate the configured backends, in config order.
#[must_use]
pub fn build(config: &EngineConfig, runner: &Arc<dyn CommandRunner>) -> Vec<Arc<dyn EnforcementBackend>> {
    config
        .backends
        .iter()
        .map(|backend| -> Arc<dyn EnforcementBackend> {
            match backend {
                BackendConfig::ProxyAcl(s) => {
                    Arc::new(ProxyAclBackend::new(s.clone(), Arc::clone(runner)))
                }
                BackendConfig::HostsFile(s) => Arc::new(HostsFileBackend::new(s.clone())),
                BackendConfig::Firewall(s) => {
                    Arc::new(FirewallBackend::new(s.clone(), Arc::clone(runner)))
                }
                BackendConfig::Pac(s) => Arc::new(PacProxyBackend::new(s.clone())),
            }
        })
        .collect()
}

/// The artifact a backend last applied successfully, for `verify`.
#[derive(Default)]
struct LastApplied(Mutex<Option<EnforcementArtifact>>);

impl LastApplied {
    async fn set(&self, artifact: &EnforcementArtifact) {
        *self.0.lock().await = Some(artifact.clone());
    }

    async fn get(&self) -> Option<EnforcementArtifact> {
        self.0.lock().await.clone()
    }
}

fn unexpected_body(backend: &str) -> BackendError {
    BackendError::permanent(backend, "artifact was rendered for a different backend kind")
}

fn join_error(backend: &str, err: &tokio::task::JoinError) -> BackendError {
    BackendError::transient(backend, format!("I/O task failed: {err}"))
}

/// Atomically replace every file, in order.
async fn write_files(backend: &str, files: &[FileArtifact]) -> Result<(), BackendError> {
    let name = backend.to_string();
    let files = files.to_vec();
    tokio::task::spawn_blocking(move || {
        for file in &files {
            write_atomic(&file.path, file.content.as_bytes(), None).map_err(|e| {
                BackendError::from_io(&name, &format!("writing {}", file.path.display()), &e)
            })?;
        }
        Ok(())
    })
    .await
    .map_err(|e| join_error(backend, &e))?
}

/// Byte-for-byte comparison of the live files with `files`.
async fn files_match(backend: &str, files: &[FileArtifact]) -> Result<bool, BackendError> {
    let name = backend.to_string();
    let files = files.to_vec();
    tokio::task::spawn_blocking(move || {
        for file in &files {
            match std::fs::read(&file.path) {
                Ok(live) if live == file.content.as_bytes() => {}
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
                Err(e) => {
                    return Err(BackendError::from_io(
                        &name,
                        &format!("reading {}", file.path.display()),
                        &e,
                    ));
                }
            }
        }
        Ok(true)
    })
    .await
    .map_err(|e| join_error(backend, &e))?
}

/// Run an external command; spawn errors and timeouts are transient,
/// non-zero exits are classified from stderr.
async fn run_checked(
    backend: &str,
    runner: &dyn CommandRunner,
    argv: &[String],
) -> Result<std::process::Output, BackendError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(BackendError::permanent(backend, "empty command"));
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = runner
        .run(program, &args)
        .await
        .map_err(|e| BackendError::transient(backend, format!("{e:#}")))?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(BackendError::from_command(
            backend,
            program,
            &String::from_utf8_lossy(&output.stderr),
        ))
    }
}
