//! `curfew render <backend>`

use anyhow::{Result, bail};
use clap::Args;

use crate::app::AppContext;
use crate::commands::with_engine;

#[derive(Args)]
pub struct RenderArgs {
    /// Backend name from the config (e.g. squid, hosts, firewall, pac)
    pub backend: String,
}

/// Print the artifact `backend` would apply for the current policy.
/// Nothing is written.
///
/// # Errors
///
/// Returns an error if no backend has that name.
pub async fn run(app: &AppContext, args: &RenderArgs) -> Result<()> {
    with_engine(app, async |service| {
        let Some(artifact) = service.preview(&args.backend).await else {
            let known = service.reconciler().backend_names().join(", ");
            bail!("unknown backend: {} (configured: {known})", args.backend);
        };
        app.renderer().render_artifact(&artifact)
    })
    .await
}
