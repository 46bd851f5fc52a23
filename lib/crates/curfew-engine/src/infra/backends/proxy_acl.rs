//! Squid forward proxy: URL-regex ACL file, generated `squid.conf`, reload.

use std::sync::Arc;

use async_trait::async_trait;
use curfew_common::Policy;
use tracing::debug;

use super::{LastApplied, files_match, run_checked, unexpected_body, write_files};
use crate::application::ports::{CommandRunner, EnforcementBackend};
use crate::domain::render::squid::{self, SquidConfig};
use crate::domain::{ArtifactBody, BackendError, EnforcementArtifact, FileArtifact, ProxyAclSettings};

pub struct ProxyAclBackend {
    settings: ProxyAclSettings,
    runner: Arc<dyn CommandRunner>,
    last: LastApplied,
}

impl ProxyAclBackend {
    #[must_use]
    pub fn new(settings: ProxyAclSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            last: LastApplied::default(),
        }
    }
}

#[async_trait]
impl EnforcementBackend for ProxyAclBackend {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn render(&self, policy: &Policy, domains: &[String]) -> EnforcementArtifact {
        let config = squid::render_config(&SquidConfig {
            http_port: &self.settings.http_port,
            acl_path: &self.settings.acl_path,
            access_log: &self.settings.access_log,
            internet_blocked: policy.internet_blocked,
            has_blocked_domains: !domains.is_empty(),
        });
        EnforcementArtifact {
            backend: self.settings.name.clone(),
            revision: policy.revision,
            body: ArtifactBody::Files {
                files: vec![
                    FileArtifact {
                        path: self.settings.acl_path.clone(),
                        content: squid::render_acl(domains),
                    },
                    FileArtifact {
                        path: self.settings.config_path.clone(),
                        content: config,
                    },
                ],
            },
        }
    }

    async fn apply(&self, artifact: &EnforcementArtifact) -> Result<(), BackendError> {
        let ArtifactBody::Files { files } = &artifact.body else {
            return Err(unexpected_body(self.name()));
        };
        write_files(self.name(), files).await?;
        self.last.set(artifact).await;
        run_checked(self.name(), self.runner.as_ref(), &self.settings.reload_command).await?;
        debug!(backend = self.name(), "proxy reloaded");
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
