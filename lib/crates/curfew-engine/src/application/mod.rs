//! Application layer: port traits, the policy store, the reconciliation
//! worker and the use-case facade.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`.

pub mod ports;
pub mod reconciler;
pub mod service;
pub mod store;

pub use ports::{AuditSink, CommandRunner, EnforcementBackend, PolicyDocument, PolicyRepository};
pub use reconciler::{Reconciler, RetryPolicy};
pub use service::{Change, GroupUpdate, PolicyService};
pub use store::{GroupChange, Mutation, PolicyStore, StoreError};
