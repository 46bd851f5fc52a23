//! Proxy auto-config file.

use async_trait::async_trait;
use curfew_common::Policy;

use super::{LastApplied, files_match, unexpected_body, write_files};
use crate::application::ports::EnforcementBackend;
use crate::domain::render::pac;
use crate::domain::{ArtifactBody, BackendError, EnforcementArtifact, FileArtifact, PacSettings};

pub struct PacProxyBackend {
    settings: PacSettings,
    last: LastApplied,
}

impl PacProxyBackend {
    #[must_use]
    pub fn new(settings: PacSettings) -> Self {
        Self {
            settings,
            last: LastApplied::default(),
        }
    }
}

#[async_trait]
impl EnforcementBackend for PacProxyBackend {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn render(&self, policy: &Policy, domains: &[String]) -> EnforcementArtifact {
        EnforcementArtifact {
            backend: self.settings.name.clone(),
            revision: policy.revision,
            body: ArtifactBody::Files {
                files: vec![FileArtifact {
                    path: self.settings.path.clone(),
                    content: pac::render(
                        domains,
                        policy.internet_blocked,
                        &self.settings.blackhole_proxy,
                    ),
                }],
            },
        }
    }

    async fn apply(&self, artifact: &EnforcementArtifact) -> Result<(), BackendError> {
        let ArtifactBody::Files { files } = &artifact.body else {
            return Err(unexpected_body(self.name()));
        };
        write_files(self.name(), files).await?;
        self.last.set(artifact).await;
        Ok(())
    }

    async fn verify(&self) -> Result<bool, BackendError> {
        match self.last.get().await {
            Some(EnforcementArtifact {
                body: ArtifactBody::Files { files },
                ..
            }) => files_match(self.name(), &files).await,
            _ => Ok(false),
        }
    }
}
