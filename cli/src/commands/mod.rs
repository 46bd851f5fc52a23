//! Command implementations

pub mod apps;
pub mod internet;
pub mod reconcile;
pub mod render;
pub mod reset;
pub mod restrict;
pub mod status;
pub mod version;

use anyhow::Result;
use curfew_engine::PolicyService;
use tracing::debug;

use crate::app::AppContext;

/// Start the engine, run `f` against it, then stop the worker.
///
/// The worker is stopped even when `f` fails; a pass in flight is allowed
/// to finish first.
pub(crate) async fn with_engine<F>(app: &AppContext, f: F) -> Result<()>
where
    F: AsyncFnOnce(&PolicyService) -> Result<()>,
{
    let engine = app.start_engine().await?;
    debug!(backends = ?engine.service.reconciler().backend_names(), "engine started");
    let result = f(&engine.service).await;
    engine.shutdown().await?;
    debug!(ok = result.is_ok(), "engine stopped");
    result
}
