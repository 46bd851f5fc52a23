//! `curfew reset`

use anyhow::Result;
use clap::Args;
use curfew_common::PolicyResponse;

use crate::app::AppContext;
use crate::commands::with_engine;

#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Clear every restriction and the internet block.
///
/// # Errors
///
/// Returns an error if the prompt fails or the policy cannot be saved.
pub async fn run(app: &AppContext) -> Result<()> {
    if !app.non_interactive
        && !app.confirm("Remove all restrictions and allow the internet?", false)?
    {
        app.output.info("Cancelled");
        return Ok(());
    }
    with_engine(app, async |service| {
        let change = service.reset().await?;
        let summary = if change.ticket.is_some() {
            "All restrictions removed"
        } else {
            "Nothing is restricted"
        };
        let reconciliation = app.wait(service, change.ticket).await;
        app.renderer().render_change(
            summary,
            &PolicyResponse {
                success: true,
                policy: change.policy,
                reconciliation,
            },
        )
    })
    .await
}
