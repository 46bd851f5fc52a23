//! `curfew restrict` / `curfew allow`

use anyhow::Result;
use clap::Args;
use curfew_common::PolicyResponse;

use crate::app::AppContext;
use crate::commands::with_engine;

#[derive(Args)]
pub struct AppArgs {
    /// App or site name (case-insensitive), see `curfew apps list`
    pub app: String,
}

/// Block one app and wait for enforcement.
///
/// # Errors
///
/// Returns an error for unknown apps or if the policy cannot be saved.
pub async fn restrict(app: &AppContext, args: &AppArgs) -> Result<()> {
    with_engine(app, async |service| {
        let change = service.restrict(&args.app).await?;
        let name = service.app_name(&args.app).await.unwrap_or_else(|| args.app.clone());
        let summary = if change.ticket.is_some() {
            format!("{name} restricted")
        } else {
            format!("{name} is already restricted")
        };
        let reconciliation = app.wait(service, change.ticket).await;
        app.renderer().render_change(
            &summary,
            &PolicyResponse {
                success: true,
                policy: change.policy,
                reconciliation,
            },
        )
    })
    .await
}

/// Unblock one app and wait for enforcement.
///
/// # Errors
///
/// Returns an error for unknown apps or if the policy cannot be saved.
pub async fn allow(app: &AppContext, args: &AppArgs) -> Result<()> {
    with_engine(app, async |service| {
        let change = service.allow(&args.app).await?;
        let name = service.app_name(&args.app).await.unwrap_or_else(|| args.app.clone());
        let summary = if change.ticket.is_some() {
            format!("{name} allowed")
        } else {
            format!("{name} is not restricted")
        };
        let reconciliation = app.wait(service, change.ticket).await;
        app.renderer().render_change(
            &summary,
            &PolicyResponse {
                success: true,
                policy: change.policy,
                reconciliation,
            },
        )
    })
    .await
}
