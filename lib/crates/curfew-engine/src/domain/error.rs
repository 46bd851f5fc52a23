//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs` or `std::process`. All error types implement
//! `thiserror::Error` and convert to `anyhow::Error` via the `?` operator.

use thiserror::Error;

// ── Catalog errors ────────────────────────────────────────────────────────────

/// Validation errors raised before any policy or catalog state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown app: {0}")]
    UnknownGroup(String),

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("invalid app name: {0:?}")]
    InvalidName(String),

    #[error("app '{0}' has no domains")]
    EmptyGroup(String),

    #[error("app '{0}' is built in and cannot be removed")]
    BuiltinGroup(String),
}

// ── Backend errors ────────────────────────────────────────────────────────────

/// Failure of an enforcement backend's apply or verify step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// I/O hiccup or failed external command; the next pass retries.
    #[error("{backend}: {message}")]
    Transient { backend: String, message: String },

    /// Missing privilege or similar; retrying without operator action is pointless.
    #[error("{backend}: {message} (permanent)")]
    Permanent { backend: String, message: String },
}

impl BackendError {
    pub fn transient(backend: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    pub fn permanent(backend: &str, message: impl Into<String>) -> Self {
        Self::Permanent {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    /// Classify an I/O error: `PermissionDenied` and read-only filesystems are permanent.
    #[must_use]
    pub fn from_io(backend: &str, context: &str, err: &std::io::Error) -> Self {
        let message = format!("{context}: {err}");
        match err.kind() {
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::ReadOnlyFilesystem => {
                Self::permanent(backend, message)
            }
            _ => Self::transient(backend, message),
        }
    }

    /// Classify a failed external command from its stderr.
    #[must_use]
    pub fn from_command(backend: &str, program: &str, stderr: &str) -> Self {
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            format!("{program} exited with failure")
        } else {
            format!("{program} failed: {stderr}")
        };
        let lowered = stderr.to_ascii_lowercase();
        if PERMANENT_MARKERS.iter().any(|m| lowered.contains(m)) {
            Self::permanent(backend, message)
        } else {
            Self::transient(backend, message)
        }
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transient { message, .. } | Self::Permanent { message, .. } => message,
        }
    }
}

/// Stderr fragments that mean the process lacks privilege.
const PERMANENT_MARKERS: &[&str] = &[
    "permission denied",
    "access denied",
    "operation not permitted",
    "interactive authentication required",
    "a password is required",
];

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors from validating the engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no enforcement backends configured")]
    NoBackends,

    #[error("backend name '{0}' is used more than once")]
    DuplicateBackend(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
