//! Mapping from engine errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use curfew_common::ErrorBody;
use curfew_engine::{CatalogError, StoreError};

/// An error response: status plus `{ "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Map a store error. `unknown` is the status for an unknown app name:
    /// 400 when the name is part of a request body or action, 404 when it
    /// addresses the resource itself.
    #[must_use]
    pub fn from_store(err: StoreError, unknown: StatusCode) -> Self {
        match err {
            StoreError::Catalog(e) => match e {
                CatalogError::UnknownGroup(_) => Self::new(unknown, "unknown app"),
                CatalogError::BuiltinGroup(_) => Self::new(StatusCode::BAD_REQUEST, "built-in app"),
                CatalogError::InvalidDomain(d) => {
                    Self::new(StatusCode::BAD_REQUEST, format!("invalid domain: {d}"))
                }
                CatalogError::InvalidName(_) => {
                    Self::new(StatusCode::BAD_REQUEST, "invalid app name")
                }
                CatalogError::EmptyGroup(_) => {
                    Self::new(StatusCode::BAD_REQUEST, "no domains given")
                }
            },
            StoreError::Persist(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to persist policy");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to save policy")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::from_store(err, StatusCode::BAD_REQUEST)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}
