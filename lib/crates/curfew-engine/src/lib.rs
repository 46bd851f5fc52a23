//! Curfew engine: domain catalog, policy store, enforcement backends and the
//! reconciliation worker that keeps them converged.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod domain;
pub mod infra;

pub use application::{PolicyService, StoreError};
pub use domain::{CatalogError, EngineConfig};
pub use infra::Engine;
