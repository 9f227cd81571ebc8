//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;

use recipe_deploy_core::pipeline::DeployPlan;
use recipe_deploy_core::submit::SubmissionReport;

const UNAVAILABLE: &str = "unavailable";

/// Formats one accepted submission as a single line.
#[must_use]
pub fn format_report(report: &SubmissionReport) -> String {
    let recipe = report
        .recipe
        .as_ref()
        .map_or_else(|| "<all>".to_owned(), ToString::to_string);
    format!(
        "submitted {recipe}: job_id={} job_name={}",
        report.result.job_id.as_deref().unwrap_or(UNAVAILABLE),
        report.result.job_name.as_deref().unwrap_or(UNAVAILABLE),
    )
}

/// Formats a dry-run plan, one command per line.
#[must_use]
pub fn format_plan(plan: &DeployPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "feedstock: {}", plan.config.feedstock_subdir());
    match &plan.install {
        Some(cmd) => {
            let _ = writeln!(out, "install:   {cmd}");
        }
        None => {
            let _ = writeln!(out, "install:   (no requirements.txt)");
        }
    }
    for submission in &plan.submissions {
        let _ = writeln!(out, "submit:    {}", submission.command);
    }
    out
}
