//! `curfew internet block|allow`

use anyhow::Result;
use clap::Subcommand;
use curfew_common::PolicyResponse;

use crate::app::AppContext;
use crate::commands::with_engine;

#[derive(Subcommand)]
pub enum InternetCommand {
    /// Block every destination
    Block,
    /// Lift the global block (restricted apps stay blocked)
    Allow,
}

/// Run the internet command.
///
/// # Errors
///
/// Returns an error if the policy cannot be saved.
pub async fn run(app: &AppContext, cmd: InternetCommand) -> Result<()> {
    let blocked = matches!(cmd, InternetCommand::Block);
    with_engine(app, async |service| {
        let change = service.set_internet_blocked(blocked).await?;
        let summary = match (blocked, change.ticket.is_some()) {
            (true, true) => "Internet blocked",
            (true, false) => "Internet is already blocked",
            (false, true) => "Internet allowed",
            (false, false) => "Internet is already allowed",
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
