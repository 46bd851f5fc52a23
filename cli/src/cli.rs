//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Restrict apps and sites on this machine
#[derive(Parser)]
#[command(
    name = "curfew",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show restrictions and enforcement state
    Status,

    /// Manage the app catalog
    #[command(subcommand)]
    Apps(commands::apps::AppsCommand),

    /// Block an app or site
    Restrict(commands::restrict::AppArgs),

    /// Unblock an app or site
    Allow(commands::restrict::AppArgs),

    /// Block or allow all internet access
    #[command(subcommand)]
    Internet(commands::internet::InternetCommand),

    /// Remove every restriction
    Reset(commands::reset::ResetArgs),

    /// Re-apply the current policy to every backend
    Reconcile,

    /// Print what a backend would write, without applying it
    Render(commands::render::RenderArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            command,
        } = self;
        let yes = matches!(&command, Command::Reset(args) if args.yes);
        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            json,
            yes,
        });

        match command {
            Command::Version => commands::version::run(&app),
            Command::Status => commands::status::run(&app).await,
            Command::Apps(cmd) => commands::apps::run(&app, cmd).await,
            Command::Restrict(args) => commands::restrict::restrict(&app, &args).await,
            Command::Allow(args) => commands::restrict::allow(&app, &args).await,
            Command::Internet(cmd) => commands::internet::run(&app, cmd).await,
            Command::Reset(_) => commands::reset::run(&app).await,
            Command::Reconcile => commands::reconcile::run(&app).await,
            Command::Render(args) => commands::render::run(&app, &args).await,
        }
    }
}
