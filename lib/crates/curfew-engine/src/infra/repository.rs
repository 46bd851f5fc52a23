//! Infrastructure implementation of the `PolicyRepository` port.
//!
//! `JsonPolicyRepository` keeps the policy document in a single JSON file,
//! loaded and saved on the blocking pool with an atomic replace (mode 600).

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::ports::{PolicyDocument, PolicyRepository};
use crate::infra::atomic::write_atomic;

pub struct JsonPolicyRepository {
    path: PathBuf,
}

impl JsonPolicyRepository {
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_sync(&self) -> Result<Option<PolicyDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading policy file {}", self.path.display()))?;
        let document: PolicyDocument = serde_json::from_str(&content)
            .with_context(|| format!("parsing policy file {}", self.path.display()))?;
        Ok(Some(document))
    }

    fn save_sync(&self, document: &PolicyDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(document).context("serializing policy")?;
        write_atomic(&self.path, content.as_bytes(), Some(0o600))
            .with_context(|| format!("writing policy file {}", self.path.display()))
    }
}

#[async_trait]
impl PolicyRepository for JsonPolicyRepository {
    async fn load(&self) -> Result<Option<PolicyDocument>> {
        let repo = Self::with_path(self.path.clone());
        tokio::task::spawn_blocking(move || repo.load_sync())
            .await
            .context("policy load task panicked")?
    }

    async fn save(&self, document: &PolicyDocument) -> Result<()> {
        let repo = Self::with_path(self.path.clone());
        let document = document.clone();
        tokio::task::spawn_blocking(move || repo.save_sync(&document))
            .await
            .context("policy save task panicked")?
    }
}
