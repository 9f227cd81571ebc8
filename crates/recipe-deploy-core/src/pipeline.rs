//! Deployment pipeline that ties the stages together.
//!
//! Config resolution, label resolution, dependency install, then job
//! submission, strictly in that order. The install step must succeed
//! before the runner is invoked at all.

use recipe_deploy_common::config::ActionSettings;
use recipe_deploy_common::error::Result;
use recipe_deploy_common::types::RecipeId;

use crate::deps;
use crate::github::{GitHubClient, PullRequestSource};
use crate::labels;
use crate::process::{CommandRunner, CommandSpec, SystemRunner};
use crate::runner_config::RunConfig;
use crate::submit::{self, PlannedSubmission, SubmissionReport};

/// Placeholder for the config file argument in a dry run.
pub const PLANNED_CONFIG_ARG: &str = "<config.json>";

/// Everything a deployment would do, without doing it.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    /// Resolved runner config.
    pub config: RunConfig,
    /// Recipes selected from labels; empty means all recipes.
    pub recipes: Vec<RecipeId>,
    /// Dependency install command, if the feedstock has requirements.
    pub install: Option<CommandSpec>,
    /// Runner invocations, in submission order.
    pub submissions: Vec<PlannedSubmission>,
}

/// Runs deployments for one set of action settings.
///
/// Holds the hosting API client and the process runner so tests can
/// substitute both.
pub struct Deployer {
    settings: ActionSettings,
    pulls: Box<dyn PullRequestSource>,
    runner: Box<dyn CommandRunner>,
}

impl Deployer {
    /// Creates a deployer that talks to GitHub and runs real processes.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: ActionSettings) -> Result<Self> {
        let pulls = GitHubClient::new(&settings)?;
        Ok(Self::with_backends(
            settings,
            Box::new(pulls),
            Box::new(SystemRunner),
        ))
    }

    /// Creates a deployer with explicit backends.
    #[must_use]
    pub fn with_backends(
        settings: ActionSettings,
        pulls: Box<dyn PullRequestSource>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            pulls,
            runner,
        }
    }

    fn resolve(&self) -> Result<(RunConfig, Vec<RecipeId>)> {
        tracing::info!(settings = ?self.settings, "starting deployment");
        let config = RunConfig::resolve(&self.settings.config_source, &self.settings.workdir)?;
        tracing::info!(config = ?config.entries(), "resolved runner config");
        let recipes = labels::resolve_recipes(&self.settings, self.pulls.as_ref())?;
        Ok((config, recipes))
    }

    /// Resolves config, labels and the install step, and builds every
    /// runner invocation without executing anything.
    ///
    /// # Errors
    ///
    /// Returns config, hosting API, or directory listing errors.
    pub fn plan(&self) -> Result<DeployPlan> {
        let (config, recipes) = self.resolve()?;
        let install = deps::plan_install(
            &self.settings.workdir,
            config.feedstock_subdir(),
            self.settings.conda_env.as_deref(),
        )?;
        let submissions = submit::plan_submissions(&self.settings, &recipes, PLANNED_CONFIG_ARG);
        Ok(DeployPlan {
            config,
            recipes,
            install,
            submissions,
        })
    }

    /// Runs the full deployment.
    ///
    /// The runner config lives in a temporary file for the duration of the
    /// submissions and is removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage; nothing is submitted after a
    /// config, hosting API, or install failure.
    pub fn deploy(&self) -> Result<Vec<SubmissionReport>> {
        let (config, recipes) = self.resolve()?;

        if let Some(cmd) = deps::install_requirements(
            self.runner.as_ref(),
            &self.settings.workdir,
            config.feedstock_subdir(),
            self.settings.conda_env.as_deref(),
        )? {
            tracing::info!(command = %cmd, "feedstock requirements installed");
        }

        let config_file = submit::write_config_file(&config)?;
        let config_arg = submit::config_arg(config_file.path())?;
        let planned = submit::plan_submissions(&self.settings, &recipes, config_arg);
        tracing::info!(
            recipe_ids = ?recipes.iter().map(RecipeId::as_str).collect::<Vec<_>>(),
            invocations = planned.len(),
            "submitting jobs"
        );
        submit::submit_all(self.runner.as_ref(), &planned)
    }
}
