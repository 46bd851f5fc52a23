//! Curfew CLI - restrict apps and sites on this machine

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use tracing_subscriber::EnvFilter;

use curfew_cli::cli::Cli;
use curfew_cli::commands::reconcile::NotConverged;
use curfew_cli::output::json;

#[tokio::main]
async fn main() {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = cli.run().await {
        if e.downcast_ref::<NotConverged>().is_some() {
            std::process::exit(1);
        }
        if json_mode {
            if let Ok(body) = json::format_error(&format!("{e:#}"), json::error_code(&e)) {
                println!("{body}");
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}
