//! CLI command definitions and dispatch.

pub mod deploy;
pub mod plan;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use recipe_deploy_common::config::{ActionSettings, parse_flag};
use recipe_deploy_common::constants::{DEFAULT_API_URL, DEFAULT_RUNNER_PROGRAM};
use recipe_deploy_common::types::JobNameSuffix;

/// Deploy feedstock recipes from CI through the job runner.
#[derive(Parser, Debug)]
#[command(name = "deploy-recipe", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute; `deploy` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Action inputs.
    #[command(flatten)]
    pub action: ActionArgs,

    /// Log output format.
    #[arg(long, global = true, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Command {
    /// Install feedstock requirements and submit the selected recipes.
    Deploy,
    /// Show the install and submission commands without running them.
    Plan,
}

/// Log output formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Action inputs, each also readable from its environment variable.
#[derive(Args, Debug)]
pub struct ActionArgs {
    /// Repository coordinates, `owner/name`.
    #[arg(long, global = true, env = "GITHUB_REPOSITORY", default_value = "")]
    pub repository: String,

    /// Base URL of the GitHub REST API.
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Commit SHA that triggered the run.
    #[arg(long, global = true, env = "GITHUB_SHA", default_value = "")]
    pub sha: String,

    /// Head branch of the triggering pull request (empty on push events).
    #[arg(long, global = true, env = "GITHUB_HEAD_REF", default_value = "")]
    pub head_ref: String,

    /// Numeric repository identifier.
    #[arg(long, global = true, env = "GITHUB_REPOSITORY_ID", default_value = "")]
    pub repository_id: String,

    /// CI run identifier.
    #[arg(long, global = true, env = "GITHUB_RUN_ID", default_value = "")]
    pub run_id: String,

    /// CI run attempt.
    #[arg(long, global = true, env = "GITHUB_RUN_ATTEMPT", default_value = "")]
    pub run_attempt: String,

    /// Runner config: inline JSON or a path to a JSON file (relative to `--workdir`).
    #[arg(long, global = true, env = "INPUT_PANGEO_FORGE_RUNNER_CONFIG")]
    pub config: Option<String>,

    /// Select recipes from `run:` labels on the pull request.
    #[arg(long, global = true, env = "INPUT_SELECT_RECIPE_BY_LABEL", default_value = "")]
    pub select_recipe_by_label: String,

    /// Conda environment to install feedstock requirements into.
    #[arg(long, global = true, env = "CONDA_ENV")]
    pub conda_env: Option<String>,

    /// Job-runner program.
    #[arg(long, global = true, env = "RUNNER_PROGRAM", default_value = DEFAULT_RUNNER_PROGRAM)]
    pub runner: String,

    /// Token for the GitHub REST API.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Checked-out feedstock repository.
    #[arg(long, global = true, default_value = ".")]
    pub workdir: PathBuf,
}

impl ActionArgs {
    /// Converts the parsed inputs into pipeline settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no runner config was given.
    pub fn into_settings(self) -> anyhow::Result<ActionSettings> {
        let Some(config_source) = self.config else {
            anyhow::bail!("missing runner config: pass --config or set INPUT_PANGEO_FORGE_RUNNER_CONFIG");
        };
        Ok(ActionSettings {
            repository: self.repository,
            api_url: self.api_url,
            sha: self.sha,
            head_ref: self.head_ref,
            suffix: JobNameSuffix {
                repository_id: self.repository_id,
                run_id: self.run_id,
                run_attempt: self.run_attempt,
            },
            config_source,
            select_recipe_by_label: parse_flag(&self.select_recipe_by_label),
            conda_env: self.conda_env.filter(|s| !s.is_empty()),
            runner_program: self.runner,
            github_token: self.github_token.filter(|s| !s.is_empty()),
            workdir: self.workdir,
        })
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.action.into_settings()?;
    match cli.command.unwrap_or(Command::Deploy) {
        Command::Deploy => deploy::execute(settings),
        Command::Plan => plan::execute(settings),
    }
}
