//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the output settings and knows how to start the
//! in-process engine. Adding a new cross-cutting concern requires only one
//! field change here.

use anyhow::{Context, Result};
use curfew_common::WaitStatus;
use curfew_engine::infra::config::YamlConfigStore;
use curfew_engine::{Engine, PolicyService};

use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, progress};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Skip interactive prompts (also set by `CI` / `CURFEW_YES` env vars).
    pub yes: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("CURFEW_YES").is_ok();
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            mode,
            non_interactive: flags.yes || ci_env,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `CURFEW_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    /// Load the engine configuration and start the engine in this process.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the stored policy
    /// cannot be loaded.
    pub async fn start_engine(&self) -> Result<Engine> {
        let store = YamlConfigStore::new()?;
        let config = store.load()?;
        curfew_engine::infra::start(&config)
            .await
            .context("failed to start curfew engine")
    }

    /// Wait for the pass a mutation scheduled, showing a spinner on a TTY.
    pub async fn wait(&self, service: &PolicyService, ticket: Option<u64>) -> Option<WaitStatus> {
        let ticket = ticket?;
        if self.is_json() || !self.output.show_progress() {
            return Some(service.wait(ticket).await);
        }
        let pb = progress::spinner("Applying policy...");
        let status = service.wait(ticket).await;
        match &status {
            WaitStatus::Completed(report) if report.is_committed() => {
                progress::finish_ok(&pb, "Policy applied");
            }
            WaitStatus::Completed(_) => progress::finish_warn(&pb, "Policy not fully applied"),
            WaitStatus::Timeout { .. } => progress::finish_warn(&pb, "Still applying"),
        }
        Some(status)
    }
}
