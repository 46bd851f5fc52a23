//! Status command: current policy and the last reconciliation.

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::with_engine;

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the engine cannot start.
pub async fn run(app: &AppContext) -> Result<()> {
    with_engine(app, async |service| {
        let status = service.status().await;
        app.renderer().render_status(&status)
    })
    .await
}
