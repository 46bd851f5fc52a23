//! Managed block inside the system hosts file.
//!
//! The hosts file is shared with the rest of the system, so only the
//! delimited block is ever rewritten. Internet-wide blocking cannot be
//! expressed here and is left to the other backends.

use std::path::Path;

use async_trait::async_trait;
use curfew_common::Policy;

use super::{LastApplied, join_error, unexpected_body};
use crate::application::ports::EnforcementBackend;
use crate::domain::render::hosts;
use crate::domain::{ArtifactBody, BackendError, EnforcementArtifact, HostsFileSettings};
use crate::infra::atomic::{read_or_empty, write_atomic};

pub struct HostsFileBackend {
    settings: HostsFileSettings,
    last: LastApplied,
}

impl HostsFileBackend {
    #[must_use]
    pub fn new(settings: HostsFileSettings) -> Self {
        Self {
            settings,
            last: LastApplied::default(),
        }
    }
}

fn read_hosts(backend: &str, path: &Path) -> Result<String, BackendError> {
    read_or_empty(path)
        .map_err(|e| BackendError::from_io(backend, &format!("reading {}", path.display()), &e))
}

#[async_trait]
impl EnforcementBackend for HostsFileBackend {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn render(&self, policy: &Policy, domains: &[String]) -> EnforcementArtifact {
        EnforcementArtifact {
            backend: self.settings.name.clone(),
            revision: policy.revision,
            body: ArtifactBody::HostsBlock {
                path: self.settings.path.clone(),
                lines: hosts::render_entries(
                    domains,
                    &self.settings.sink_address,
                    self.settings.include_www,
                ),
            },
        }
    }

    async fn apply(&self, artifact: &EnforcementArtifact) -> Result<(), BackendError> {
        let ArtifactBody::HostsBlock { path, lines } = &artifact.body else {
            return Err(unexpected_body(self.name()));
        };
        let name = self.name().to_string();
        let path = path.clone();
        let lines = lines.clone();
        tokio::task::spawn_blocking(move || {
            let current = read_hosts(&name, &path)?;
            let next = hosts::splice_block(&current, &lines);
            if next == current {
                return Ok(());
            }
            write_atomic(&path, next.as_bytes(), None)
                .map_err(|e| BackendError::from_io(&name, &format!("writing {}", path.display()), &e))
        })
        .await
        .map_err(|e| join_error(self.name(), &e))??;
        self.last.set(artifact).await;
        Ok(())
    }

    async fn verify(&self) -> Result<bool, BackendError> {
        let Some(EnforcementArtifact {
            body: ArtifactBody::HostsBlock { path, lines },
            ..
        }) = self.last.get().await
        else {
            return Ok(false);
        };
        let name = self.name().to_string();
        tokio::task::spawn_blocking(move || {
            let content = read_hosts(&name, &path)?;
            Ok(hosts::extract_block(&content).unwrap_or_default() == lines)
        })
        .await
        .map_err(|e| join_error(self.name(), &e))?
    }
}
