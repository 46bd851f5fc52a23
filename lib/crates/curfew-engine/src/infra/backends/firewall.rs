//! nftables firewall: one dedicated table, replaced as a whole.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use curfew_common::Policy;
use tracing::debug;

use super::{LastApplied, join_error, run_checked, unexpected_body};
use crate::application::ports::{CommandRunner, EnforcementBackend};
use crate::domain::render::nftables;
use crate::domain::{ArtifactBody, BackendError, EnforcementArtifact, FirewallSettings};
use crate::infra::atomic::write_atomic;

pub struct FirewallBackend {
    settings: FirewallSettings,
    runner: Arc<dyn CommandRunner>,
    last: LastApplied,
}

impl FirewallBackend {
    #[must_use]
    pub fn new(settings: FirewallSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            last: LastApplied::default(),
        }
    }

    fn argv(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.settings.nft_binary.as_str())
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl EnforcementBackend for FirewallBackend {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn render(&self, policy: &Policy, domains: &[String]) -> EnforcementArtifact {
        let rules = nftables::render_rules(domains, policy.internet_blocked);
        EnforcementArtifact {
            backend: self.settings.name.clone(),
            revision: policy.revision,
            body: ArtifactBody::Ruleset {
                table: self.settings.table.clone(),
                script_path: self.settings.script_path.clone(),
                script: nftables::render_script(&self.settings.table, &rules),
                rules,
            },
        }
    }

    async fn apply(&self, artifact: &EnforcementArtifact) -> Result<(), BackendError> {
        let ArtifactBody::Ruleset {
            script_path, script, ..
        } = &artifact.body
        else {
            return Err(unexpected_body(self.name()));
        };
        let name = self.name().to_string();
        let path = script_path.clone();
        let content = script.clone();
        tokio::task::spawn_blocking(move || {
            write_atomic(&path, content.as_bytes(), Some(0o600))
                .map_err(|e| BackendError::from_io(&name, &format!("writing {}", path.display()), &e))
        })
        .await
        .map_err(|e| join_error(self.name(), &e))??;

        let script_arg = script_path.display().to_string();
        run_checked(self.name(), self.runner.as_ref(), &self.argv(&["-f", &script_arg])).await?;
        self.last.set(artifact).await;
        debug!(backend = self.name(), table = %self.settings.table, "ruleset loaded");
        Ok(())
    }

    async fn verify(&self) -> Result<bool, BackendError> {
        let Some(EnforcementArtifact {
            body: ArtifactBody::Ruleset { rules, .. },
            ..
        }) = self.last.get().await
        else {
            return Ok(false);
        };
        let mut args = vec!["list", "table"];
        args.extend(self.settings.table.split_whitespace());
        let output = match run_checked(self.name(), self.runner.as_ref(), &self.argv(&args)).await {
            Ok(output) => output,
            Err(e) if e.message().contains("No such file or directory") => return Ok(false),
            Err(e) => return Err(e),
        };
        let live = nftables::parse_comments(&String::from_utf8_lossy(&output.stdout));
        let expected: BTreeSet<String> = rules.into_iter().map(|r| r.comment).collect();
        Ok(live == expected)
    }
}
