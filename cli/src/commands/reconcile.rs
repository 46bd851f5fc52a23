//! `curfew reconcile`: repair drift by re-applying the current policy.

use std::fmt;

use anyhow::Result;
use curfew_common::WaitStatus;

use crate::app::AppContext;
use crate::commands::with_engine;

/// The pass finished without converging. The report has already been
/// printed, so `main` exits non-zero without another message.
#[derive(Debug)]
pub struct NotConverged;

impl fmt::Display for NotConverged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("enforcement did not converge")
    }
}

impl std::error::Error for NotConverged {}

/// Run one pass and report it.
///
/// # Errors
///
/// [`NotConverged`] when the pass rolled back or timed out.
pub async fn run(app: &AppContext) -> Result<()> {
    with_engine(app, async |service| {
        let ticket = service.reconcile();
        let Some(status) = app.wait(service, Some(ticket)).await else {
            return Ok(());
        };
        app.renderer().render_wait(&status)?;
        match status {
            WaitStatus::Completed(report) if report.is_committed() => Ok(()),
            _ => Err(NotConverged.into()),
        }
    })
    .await
}
