//! Request and response bodies of the `curfewd` HTTP API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DomainGroup, Phase, Policy, ReconcileReport};

/// Body of `POST /policy/apps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAppRequest {
    pub name: String,
    pub domains: Vec<String>,
}

/// Body of `PUT /policy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePolicyRequest {
    #[serde(default)]
    pub restricted: Vec<String>,
    #[serde(default)]
    pub internet_blocked: bool,
}

/// Outcome of waiting for a reconciliation ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WaitStatus {
    /// A pass covering the ticket finished (committed or not).
    Completed(ReconcileReport),
    /// The wait expired; the pass keeps running and can be polled.
    Timeout { ticket: u64 },
}

/// Response to every policy mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyResponse {
    pub success: bool,
    pub policy: Policy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<WaitStatus>,
}

/// Response to `POST /policy/apps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group: DomainGroup,
    /// Present when the app is restricted and the caller asked to wait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<WaitStatus>,
}

/// Response to `POST /policy/reconcile` without waiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket: u64,
}

/// Response to `GET /policy/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub restricted: Vec<String>,
    pub internet_blocked: bool,
    pub available_apps: Vec<String>,
    #[serde(default)]
    pub custom_apps: BTreeMap<String, Vec<String>>,
    pub revision: u64,
    /// Set when the last pass hit a permanent backend failure: the policy
    /// reflects intent but enforcement is lagging.
    pub degraded: bool,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciliation: Option<ReconcileReport>,
}

/// Error body returned with every 4xx/5xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
