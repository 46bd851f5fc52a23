//! Human-readable terminal renderer.

use curfew_common::{
    BackendOutcome, DomainGroup, PolicyResponse, ReconcileReport, ReconciliationResult,
    StatusResponse, WaitStatus,
};
use curfew_engine::domain::render::hosts;
use curfew_engine::domain::{ArtifactBody, EnforcementArtifact};
use owo_colors::OwoColorize as _;

use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information. Printed even when `quiet`.
    pub fn render_version(&self, version: &str) {
        println!("curfew {version}");
    }

    /// Render the policy and enforcement summary.
    pub fn render_status(&self, status: &StatusResponse) {
        self.ctx.kv("Restricted:", &format_restricted(&status.restricted));
        self.ctx.kv(
            "Internet:",
            if status.internet_blocked {
                "blocked"
            } else {
                "allowed"
            },
        );
        self.ctx.kv("Revision:", &status.revision.to_string());
        self.ctx.kv("Enforcement:", &status.phase.to_string());

        if let Some(report) = &status.last_reconciliation {
            println!();
            self.ctx.header("Last reconciliation:");
            self.render_results(report);
        }

        if status.degraded {
            println!();
            self.ctx
                .warn("Enforcement is degraded: a backend needs operator attention");
            self.ctx.info("Run: curfew reconcile");
        }
    }

    /// Render the catalog with restriction markers.
    pub fn render_apps(&self, apps: &[DomainGroup], status: &StatusResponse) {
        if apps.is_empty() {
            self.ctx.info("No apps available");
            return;
        }
        let width = apps.iter().map(|g| g.name.len()).max().unwrap_or(0);
        for app in apps {
            let marker = if status.restricted.contains(&app.name) {
                format!("{}", "●".style(self.ctx.styles.restricted))
            } else {
                " ".to_string()
            };
            let mut tags = format_domain_count(app.domains.len());
            if status.custom_apps.contains_key(&app.name) {
                tags.push_str(", custom");
            }
            if !self.ctx.quiet {
                println!(
                    "  {marker} {:<width$}  {}",
                    app.name,
                    tags.style(self.ctx.styles.dim)
                );
            }
        }
    }

    /// Render a policy mutation and, if one ran, its reconciliation.
    pub fn render_change(&self, summary: &str, response: &PolicyResponse) {
        match &response.reconciliation {
            Some(status) => {
                self.ctx.success(summary);
                self.render_wait(status);
            }
            None => self.ctx.info(summary),
        }
    }

    /// Render a catalog mutation.
    pub fn render_group(
        &self,
        summary: &str,
        group: &DomainGroup,
        reconciliation: Option<&WaitStatus>,
    ) {
        self.ctx.success(summary);
        self.ctx.kv("Domains:", &group.domains.join(", "));
        if let Some(status) = reconciliation {
            self.render_wait(status);
        }
    }

    pub fn render_wait(&self, status: &WaitStatus) {
        match status {
            WaitStatus::Completed(report) => self.render_report(report),
            WaitStatus::Timeout { ticket } => {
                self.ctx.warn(&format!(
                    "Enforcement still in progress (ticket {ticket})"
                ));
                self.ctx.info("Run: curfew status");
            }
        }
    }

    /// Render the outcome of one reconciliation pass.
    pub fn render_report(&self, report: &ReconcileReport) {
        if report.is_committed() {
            self.ctx.success(&format!(
                "Enforcement converged (revision {})",
                report.revision
            ));
        } else {
            self.ctx.warn(&format!(
                "Enforcement did not converge (revision {})",
                report.revision
            ));
        }
        self.render_results(report);
        if !report.dropped_groups.is_empty() {
            self.ctx.warn(&format!(
                "Dropped apps that no longer exist: {}",
                report.dropped_groups.join(", ")
            ));
        }
        if !report.is_committed() {
            self.ctx.info("Run: curfew reconcile");
        }
    }

    /// Print the artifact as the backend would write it.
    pub fn render_artifact(&self, artifact: &EnforcementArtifact) {
        match &artifact.body {
            ArtifactBody::Files { files } => {
                for (i, file) in files.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    println!("# {}", file.path.display());
                    print!("{}", with_trailing_newline(&file.content));
                }
            }
            ArtifactBody::HostsBlock { path, lines } => {
                println!("# {}", path.display());
                print!("{}", hosts::splice_block("", lines));
            }
            ArtifactBody::Ruleset {
                script_path,
                script,
                ..
            } => {
                println!("# {}", script_path.display());
                print!("{}", with_trailing_newline(script));
            }
        }
    }

    fn render_results(&self, report: &ReconcileReport) {
        let width = report
            .results
            .iter()
            .map(|r| r.backend.len())
            .max()
            .unwrap_or(0);
        for result in &report.results {
            let line = format!("{:<width$}  {}", result.backend, outcome_display(result));
            if result.outcome.is_success() && result.verified != Some(false) {
                self.ctx.success(&line);
            } else {
                self.ctx.warn(&line);
            }
        }
    }
}

/// `"YouTube, TikTok"`, or `"none"`.
#[must_use]
pub fn format_restricted(restricted: &[String]) -> String {
    if restricted.is_empty() {
        "none".to_string()
    } else {
        restricted.join(", ")
    }
}

/// `"1 domain"` / `"13 domains"`.
#[must_use]
pub fn format_domain_count(count: usize) -> String {
    let noun = if count == 1 { "domain" } else { "domains" };
    format!("{count} {noun}")
}

/// One-line description of a backend result.
#[must_use]
pub fn outcome_display(result: &ReconciliationResult) -> String {
    match (&result.outcome, result.verified) {
        (BackendOutcome::Applied, Some(false)) => "applied, live state differs".to_string(),
        (BackendOutcome::Applied, Some(true)) => "applied, verified".to_string(),
        (BackendOutcome::Applied, None) => "applied".to_string(),
        (BackendOutcome::Skipped, _) => "unchanged".to_string(),
        (BackendOutcome::Deferred, _) => "not attempted".to_string(),
        (BackendOutcome::Failed { reason, permanent }, _) => {
            if *permanent {
                format!("failed: {reason} (needs attention)")
            } else {
                format!("failed: {reason}")
            }
        }
    }
}

fn with_trailing_newline(content: &str) -> String {
    if content.is_empty() || content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}
