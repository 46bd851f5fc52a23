//! Use-case facade shared by the HTTP daemon and the CLI.
//!
//! Every changed mutation requests a reconciliation and hands back its
//! ticket; callers decide whether to wait for it.

use std::sync::Arc;
use std::time::Duration;

use curfew_common::{DomainGroup, Policy, ReconcileReport, StatusResponse, WaitStatus};

use crate::application::reconciler::Reconciler;
use crate::application::store::{PolicyStore, StoreError};
use crate::domain::EnforcementArtifact;

/// A policy change plus the reconciliation it scheduled, if any.
#[derive(Debug, Clone)]
pub struct Change {
    pub policy: Policy,
    /// `None` when the request was a no-op and nothing was scheduled.
    pub ticket: Option<u64>,
}

/// A catalog change plus the reconciliation it scheduled, if any.
#[derive(Debug, Clone)]
pub struct GroupUpdate {
    pub group: DomainGroup,
    pub ticket: Option<u64>,
}

#[derive(Clone)]
pub struct PolicyService {
    store: Arc<PolicyStore>,
    reconciler: Reconciler,
    wait_timeout: Duration,
}

impl PolicyService {
    #[must_use]
    pub fn new(store: Arc<PolicyStore>, reconciler: Reconciler, wait_timeout: Duration) -> Self {
        Self {
            store,
            reconciler,
            wait_timeout,
        }
    }

    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub async fn policy(&self) -> Policy {
        self.store.get().await
    }

    /// Every catalog entry with its domains, in listing order.
    pub async fn apps(&self) -> Vec<DomainGroup> {
        let (_, catalog) = self.store.snapshot().await;
        catalog
            .list_available()
            .iter()
            .filter_map(|name| catalog.get(name).cloned())
            .collect()
    }

    /// Display name of `app`, matched case-insensitively.
    pub async fn app_name(&self, app: &str) -> Option<String> {
        let (_, catalog) = self.store.snapshot().await;
        catalog.canonical_name(app).ok()
    }

    /// # Errors
    ///
    /// `UnknownGroup`, or a persistence failure.
    pub async fn restrict(&self, app: &str) -> Result<Change, StoreError> {
        let m = self.store.set_restriction(app, true).await?;
        Ok(self.schedule(m.policy, m.changed))
    }

    /// # Errors
    ///
    /// `UnknownGroup`, or a persistence failure.
    pub async fn allow(&self, app: &str) -> Result<Change, StoreError> {
        let m = self.store.set_restriction(app, false).await?;
        Ok(self.schedule(m.policy, m.changed))
    }

    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn set_internet_blocked(&self, blocked: bool) -> Result<Change, StoreError> {
        let m = self.store.set_internet_blocked(blocked).await?;
        Ok(self.schedule(m.policy, m.changed))
    }

    /// # Errors
    ///
    /// `UnknownGroup` for the first unknown name, or a persistence failure.
    pub async fn replace(
        &self,
        restricted: &[String],
        internet_blocked: bool,
    ) -> Result<Change, StoreError> {
        let m = self.store.replace(restricted, internet_blocked).await?;
        Ok(self.schedule(m.policy, m.changed))
    }

    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn reset(&self) -> Result<Change, StoreError> {
        let m = self.store.reset().await?;
        Ok(self.schedule(m.policy, m.changed))
    }

    /// # Errors
    ///
    /// A catalog validation error, or a persistence failure.
    pub async fn add_app(&self, name: &str, domains: &[String]) -> Result<GroupUpdate, StoreError> {
        let change = self.store.add_group(name, domains).await?;
        let ticket = change.restricted.then(|| self.reconciler.request());
        Ok(GroupUpdate {
            group: change.group,
            ticket,
        })
    }

    /// Removing a restricted app schedules a pass, which prunes the
    /// restriction.
    ///
    /// # Errors
    ///
    /// `UnknownGroup`, `BuiltinGroup`, or a persistence failure.
    pub async fn remove_app(&self, name: &str) -> Result<GroupUpdate, StoreError> {
        let change = self.store.remove_group(name).await?;
        let ticket = change.restricted.then(|| self.reconciler.request());
        Ok(GroupUpdate {
            group: change.group,
            ticket,
        })
    }

    /// Request a pass regardless of policy changes (drift repair).
    #[must_use]
    pub fn reconcile(&self) -> u64 {
        self.reconciler.request()
    }

    /// Wait for `ticket` with the configured timeout.
    pub async fn wait(&self, ticket: u64) -> WaitStatus {
        self.reconciler.wait(ticket, self.wait_timeout).await
    }

    /// Wait for `ticket` when a mutation scheduled one.
    pub async fn wait_for(&self, ticket: Option<u64>) -> Option<WaitStatus> {
        match ticket {
            Some(t) => Some(self.wait(t).await),
            None => None,
        }
    }

    /// Render one backend's artifact for the current policy without applying it.
    pub async fn preview(&self, backend: &str) -> Option<EnforcementArtifact> {
        self.reconciler.preview(backend).await
    }

    #[must_use]
    pub fn last_report(&self) -> Option<ReconcileReport> {
        self.reconciler.last_report()
    }

    pub async fn status(&self) -> StatusResponse {
        let (policy, catalog) = self.store.snapshot().await;
        StatusResponse {
            restricted: policy.restricted_groups.iter().cloned().collect(),
            internet_blocked: policy.internet_blocked,
            available_apps: catalog.list_available(),
            custom_apps: catalog
                .custom_groups()
                .into_iter()
                .map(|g| (g.name, g.domains))
                .collect(),
            revision: policy.revision,
            degraded: self.reconciler.degraded(),
            phase: self.reconciler.phase(),
            last_reconciliation: self.reconciler.last_report(),
        }
    }

    fn schedule(&self, policy: Policy, changed: bool) -> Change {
        let ticket = changed.then(|| self.reconciler.request());
        Change { policy, ticket }
    }
}
