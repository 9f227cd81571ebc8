//! Action settings: every externally provided parameter of a run.
//!
//! Built once at the process boundary (the CLI reads them from flags or
//! environment variables) and passed by reference through the pipeline.
//! Nothing below the CLI reads ambient process state.

use std::fmt;
use std::path::PathBuf;

use crate::types::JobNameSuffix;

/// Immutable settings for one deployment run.
#[derive(Clone)]
pub struct ActionSettings {
    /// Repository coordinates, `owner/name`.
    pub repository: String,
    /// Base URL of the hosting REST API.
    pub api_url: String,
    /// Commit SHA that triggered the run.
    pub sha: String,
    /// Head branch of the triggering pull request; empty on push events.
    pub head_ref: String,
    /// Components of the stable job-name suffix.
    pub suffix: JobNameSuffix,
    /// Runner config source: inline JSON text or a path to a JSON file.
    pub config_source: String,
    /// Whether recipes are selected from pull-request labels.
    pub select_recipe_by_label: bool,
    /// Environment the dependency install runs in, if any.
    pub conda_env: Option<String>,
    /// Job-runner program to invoke.
    pub runner_program: String,
    /// Bearer token for the hosting API.
    pub github_token: Option<String>,
    /// Directory the feedstock repository is checked out in.
    pub workdir: PathBuf,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            repository: String::new(),
            api_url: crate::constants::DEFAULT_API_URL.to_owned(),
            sha: String::new(),
            head_ref: String::new(),
            suffix: JobNameSuffix::default(),
            config_source: "{}".to_owned(),
            select_recipe_by_label: false,
            conda_env: None,
            runner_program: crate::constants::DEFAULT_RUNNER_PROGRAM.to_owned(),
            github_token: None,
            workdir: PathBuf::from("."),
        }
    }
}

impl fmt::Debug for ActionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSettings")
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .field("sha", &self.sha)
            .field("head_ref", &self.head_ref)
            .field("suffix", &self.suffix)
            .field("config_source", &self.config_source)
            .field("select_recipe_by_label", &self.select_recipe_by_label)
            .field("conda_env", &self.conda_env)
            .field("runner_program", &self.runner_program)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("workdir", &self.workdir)
            .finish()
    }
}

/// Interprets a boolean-like action input.
///
/// Empty, `false`, `0`, `no` and `off` (trimmed, case-insensitive) are
/// false; any other value is true.
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    let value = raw.trim().to_ascii_lowercase();
    !matches!(value.as_str(), "" | "false" | "0" | "no" | "off")
}
