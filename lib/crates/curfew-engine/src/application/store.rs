//! Policy store: the single restriction state plus the domain catalog.
//!
//! Readers take a shared lock and get a clone. Writers take the exclusive
//! lock, compute the next state, persist it through the repository and only
//! then swap it in, so a failed write leaves memory untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use curfew_common::{DomainGroup, Policy};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::application::ports::{PolicyDocument, PolicyRepository};
use crate::domain::catalog::DomainCatalog;
use crate::domain::error::CatalogError;
use crate::domain::policy;

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected before anything changed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// The new state could not be written; the old state is still in effect.
    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}

/// Result of a policy mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub policy: Policy,
    /// `false` when the requested state was already in effect.
    pub changed: bool,
}

/// Result of a catalog mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChange {
    pub group: DomainGroup,
    /// The group is currently restricted, so enforcement output changes.
    pub restricted: bool,
}

#[derive(Debug, Clone)]
struct Snapshot {
    policy: Policy,
    catalog: DomainCatalog,
}

impl Snapshot {
    fn document(&self) -> PolicyDocument {
        PolicyDocument {
            policy: self.policy.clone(),
            custom_groups: self.catalog.custom_groups(),
        }
    }
}

pub struct PolicyStore {
    inner: RwLock<Snapshot>,
    repo: Arc<dyn PolicyRepository>,
}

impl PolicyStore {
    /// Load the persisted document (or start from the initial state).
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read, or a persisted
    /// custom group no longer validates.
    pub async fn open(repo: Arc<dyn PolicyRepository>) -> anyhow::Result<Self> {
        let document = repo
            .load()
            .await
            .context("loading policy document")?
            .unwrap_or_default();
        let catalog = DomainCatalog::with_custom(&document.custom_groups)
            .context("loading custom apps")?;
        debug!(
            revision = document.policy.revision,
            custom = document.custom_groups.len(),
            "policy store opened"
        );
        Ok(Self {
            inner: RwLock::new(Snapshot {
                policy: document.policy,
                catalog,
            }),
            repo,
        })
    }

    pub async fn get(&self) -> Policy {
        self.inner.read().await.policy.clone()
    }

    /// Consistent policy + catalog pair, as used by one reconciliation pass.
    pub async fn snapshot(&self) -> (Policy, DomainCatalog) {
        let guard = self.inner.read().await;
        (guard.policy.clone(), guard.catalog.clone())
    }

    pub async fn list_available(&self) -> Vec<String> {
        self.inner.read().await.catalog.list_available()
    }

    pub async fn custom_groups(&self) -> Vec<DomainGroup> {
        self.inner.read().await.catalog.custom_groups()
    }

    /// Restrict or allow one app (case-insensitive name).
    ///
    /// # Errors
    ///
    /// `UnknownGroup` for names not in the catalog, or a persistence failure.
    pub async fn set_restriction(
        &self,
        group: &str,
        restricted: bool,
    ) -> Result<Mutation, StoreError> {
        let mut guard = self.inner.write().await;
        let name = guard.catalog.canonical_name(group)?;
        let next = policy::with_restriction(&guard.policy, &name, restricted);
        self.commit(&mut guard, next).await
    }

    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn set_internet_blocked(&self, blocked: bool) -> Result<Mutation, StoreError> {
        let mut guard = self.inner.write().await;
        let next = policy::with_internet_blocked(&guard.policy, blocked);
        self.commit(&mut guard, next).await
    }

    /// Replace the whole restriction state. Every name is validated first.
    ///
    /// # Errors
    ///
    /// `UnknownGroup` for the first unknown name, or a persistence failure.
    pub async fn replace(
        &self,
        groups: &[String],
        internet_blocked: bool,
    ) -> Result<Mutation, StoreError> {
        let mut guard = self.inner.write().await;
        let names = groups
            .iter()
            .map(|g| guard.catalog.canonical_name(g))
            .collect::<Result<BTreeSet<String>, _>>()?;
        let next = policy::with_state(&guard.policy, names, internet_blocked);
        self.commit(&mut guard, next).await
    }

    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn reset(&self) -> Result<Mutation, StoreError> {
        let mut guard = self.inner.write().await;
        let next = policy::reset(&guard.policy);
        self.commit(&mut guard, next).await
    }

    /// Drop restricted names that are no longer in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn prune_groups(&self, stale: &[String]) -> Result<Mutation, StoreError> {
        let mut guard = self.inner.write().await;
        let gone: Vec<String> = stale
            .iter()
            .filter(|name| !guard.catalog.contains(name))
            .cloned()
            .collect();
        let next = policy::without_groups(&guard.policy, &gone);
        self.commit(&mut guard, next).await
    }

    /// Add a custom app, or replace the domains of an existing one.
    ///
    /// # Errors
    ///
    /// A validation error (nothing changes), or a persistence failure.
    pub async fn add_group(
        &self,
        name: &str,
        domains: &[String],
    ) -> Result<GroupChange, StoreError> {
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        let group = next.catalog.add_group(name, domains)?;
        self.repo
            .save(&next.document())
            .await
            .context("saving custom app")?;
        *guard = next;
        info!(app = %group.name, domains = group.domains.len(), "app saved");
        Ok(GroupChange {
            restricted: guard.policy.is_restricted(&group.name),
            group,
        })
    }

    /// Remove a custom app (or the custom override of a built-in one).
    ///
    /// # Errors
    ///
    /// `UnknownGroup`, `BuiltinGroup`, or a persistence failure.
    pub async fn remove_group(&self, name: &str) -> Result<GroupChange, StoreError> {
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        let group = next.catalog.remove_group(name)?;
        self.repo
            .save(&next.document())
            .await
            .context("saving custom apps")?;
        *guard = next;
        info!(app = %group.name, "app removed");
        Ok(GroupChange {
            restricted: guard.policy.is_restricted(&group.name),
            group,
        })
    }

    async fn commit(
        &self,
        guard: &mut Snapshot,
        next: Option<Policy>,
    ) -> Result<Mutation, StoreError> {
        let Some(policy) = next else {
            return Ok(Mutation {
                policy: guard.policy.clone(),
                changed: false,
            });
        };
        let document = PolicyDocument {
            policy: policy.clone(),
            custom_groups: guard.catalog.custom_groups(),
        };
        self.repo
            .save(&document)
            .await
            .context("saving policy")?;
        guard.policy = policy.clone();
        info!(
            revision = policy.revision,
            restricted = ?policy.restricted_groups,
            internet_blocked = policy.internet_blocked,
            "policy updated"
        );
        Ok(Mutation {
            policy,
            changed: true,
        })
    }
}
