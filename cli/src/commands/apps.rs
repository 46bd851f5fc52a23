//! `curfew apps` subcommands: list, add and remove catalog entries.

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::commands::with_engine;

#[derive(Subcommand)]
pub enum AppsCommand {
    /// List every app, marking the restricted ones
    List,

    /// Add a custom app, or replace the domains of an existing one
    Add {
        /// App name
        name: String,
        /// Domains the app is reachable on
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Remove a custom app (restores the built-in domains of an overridden one)
    Remove {
        /// App name
        name: String,
    },
}

/// Run an apps subcommand.
///
/// # Errors
///
/// Returns an error on validation failures or if the catalog cannot be saved.
pub async fn run(app: &AppContext, cmd: AppsCommand) -> Result<()> {
    match cmd {
        AppsCommand::List => list(app).await,
        AppsCommand::Add { name, domains } => add(app, &name, &domains).await,
        AppsCommand::Remove { name } => remove(app, &name).await,
    }
}

async fn list(app: &AppContext) -> Result<()> {
    with_engine(app, async |service| {
        let apps = service.apps().await;
        let status = service.status().await;
        app.renderer().render_apps(&apps, &status)
    })
    .await
}

async fn add(app: &AppContext, name: &str, domains: &[String]) -> Result<()> {
    with_engine(app, async |service| {
        let update = service.add_app(name, domains).await?;
        let reconciliation = app.wait(service, update.ticket).await;
        app.renderer().render_group(
            &format!("Saved {}", update.group.name),
            &update.group,
            reconciliation.as_ref(),
        )
    })
    .await
}

async fn remove(app: &AppContext, name: &str) -> Result<()> {
    with_engine(app, async |service| {
        let update = service.remove_app(name).await?;
        let summary = if update.group.builtin {
            format!("Restored built-in domains of {}", update.group.name)
        } else {
            format!("Removed {}", update.group.name)
        };
        let reconciliation = app.wait(service, update.ticket).await;
        app.renderer()
            .render_group(&summary, &update.group, reconciliation.as_ref())
    })
    .await
}
