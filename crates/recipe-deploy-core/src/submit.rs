//! Job submission through the runner's `bake` subcommand.
//!
//! One invocation per selected recipe, or a single unscoped invocation
//! when no recipe was selected. The runner prints arbitrary log lines
//! followed by one JSON object describing the submitted job.

use std::path::Path;

use recipe_deploy_common::config::ActionSettings;
use recipe_deploy_common::constants::BAKE_SUBCOMMAND;
use recipe_deploy_common::error::{DeployError, Result};
use recipe_deploy_common::types::{JobResult, RecipeId};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::process::{self, CommandRunner, CommandSpec};
use crate::runner_config::RunConfig;

/// One runner invocation, built but not yet run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSubmission {
    /// Recipe the invocation is scoped to; `None` submits every recipe.
    pub recipe: Option<RecipeId>,
    /// Job name passed to the runner, if any.
    pub job_name: Option<String>,
    /// Full command line.
    pub command: CommandSpec,
}

/// A submission the runner accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Recipe the invocation was scoped to; `None` for an unscoped run.
    pub recipe: Option<RecipeId>,
    /// Identifiers the runner reported.
    pub result: JobResult,
}

/// Builds the invariant part of every `bake` invocation.
#[must_use]
pub fn base_command(settings: &ActionSettings, config_arg: &str) -> CommandSpec {
    CommandSpec::new(&settings.runner_program)
        .args([
            BAKE_SUBCOMMAND.to_owned(),
            "--repo=.".to_owned(),
            "--json".to_owned(),
            format!("-f={config_arg}"),
        ])
        .current_dir(&settings.workdir)
}

/// Builds the invocations for `recipes`, in order.
///
/// `config_arg` is what the runner receives as its config file argument.
#[must_use]
pub fn plan_submissions(
    settings: &ActionSettings,
    recipes: &[RecipeId],
    config_arg: &str,
) -> Vec<PlannedSubmission> {
    let base = base_command(settings, config_arg);
    if recipes.is_empty() {
        return vec![PlannedSubmission {
            recipe: None,
            job_name: None,
            command: base,
        }];
    }

    recipes
        .iter()
        .map(|recipe| {
            let job_name = settings.suffix.job_name_for(recipe);
            let command = base.clone().args([
                format!("--Bake.recipe_id={recipe}"),
                format!("--Bake.job_name={job_name}"),
            ]);
            PlannedSubmission {
                recipe: Some(recipe.clone()),
                job_name: Some(job_name),
                command,
            }
        })
        .collect()
}

/// Writes `config` to a fresh temporary JSON file.
///
/// The file is deleted when the returned handle is dropped.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_config_file(config: &RunConfig) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("runner-config-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| DeployError::Io {
            path: std::env::temp_dir(),
            source: e,
        })?;
    config.write_json(file.as_file())?;
    tracing::debug!(path = %file.path().display(), "wrote runner config");
    Ok(file)
}

/// Returns `path` as the runner's `-f=` argument.
///
/// # Errors
///
/// Returns `DeployError::Io` if the path is not valid UTF-8.
pub fn config_arg(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| DeployError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "config file path is not valid UTF-8",
        ),
    })
}

/// Parses the runner's job report from its captured stdout.
///
/// The final non-empty line must be a JSON object. `job_id` and
/// `job_name` are optional; non-string values are kept in their JSON
/// rendering.
///
/// # Errors
///
/// Returns the reason the output was rejected.
pub fn parse_job_result(stdout: &str) -> std::result::Result<JobResult, String> {
    let last = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| "runner produced no output".to_owned())?;

    let value: Value =
        serde_json::from_str(last).map_err(|e| format!("final line is not JSON: {e}"))?;
    let Value::Object(fields) = value else {
        return Err(format!("final line is not a JSON object: {last}"));
    };

    let field = |key: &str| match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };
    Ok(JobResult {
        job_id: field("job_id"),
        job_name: field("job_name"),
    })
}

/// Runs one planned submission.
///
/// # Errors
///
/// Returns `DeployError::Submission` if the runner exits non-zero and
/// `DeployError::MalformedOutput` if its final line is not a job report.
pub fn submit_one(
    runner: &dyn CommandRunner,
    planned: &PlannedSubmission,
) -> Result<SubmissionReport> {
    if let Some(job_name) = &planned.job_name {
        tracing::info!(job_name = %job_name, "submitting job");
    } else {
        tracing::info!("submitting all recipes");
    }

    let output = process::run_logged(runner, &planned.command)?;
    if !output.success() {
        return Err(DeployError::Submission {
            command: planned.command.to_string(),
            stderr: output.stderr,
        });
    }

    let result =
        parse_job_result(&output.stdout).map_err(|reason| DeployError::MalformedOutput {
            command: planned.command.to_string(),
            stdout: output.stdout.clone(),
            reason,
        })?;
    tracing::info!(
        job_id = result.job_id.as_deref().unwrap_or("unavailable"),
        job_name = result.job_name.as_deref().unwrap_or("unavailable"),
        "job submitted"
    );
    Ok(SubmissionReport {
        recipe: planned.recipe.clone(),
        result,
    })
}

/// Runs every planned submission in order, stopping at the first failure.
///
/// Submissions accepted before a failure stay accepted; they are logged
/// before the error is returned.
///
/// # Errors
///
/// Returns the first submission's error.
pub fn submit_all(
    runner: &dyn CommandRunner,
    planned: &[PlannedSubmission],
) -> Result<Vec<SubmissionReport>> {
    let mut reports = Vec::with_capacity(planned.len());
    for submission in planned {
        match submit_one(runner, submission) {
            Ok(report) => reports.push(report),
            Err(e) => {
                if !reports.is_empty() {
                    tracing::warn!(
                        accepted = reports.len(),
                        remaining = planned.len() - reports.len() - 1,
                        "aborting after failed submission; earlier submissions remain accepted"
                    );
                }
                return Err(e);
            }
        }
    }
    Ok(reports)
}
