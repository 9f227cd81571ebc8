//! Fixed names, prefixes, and limits shared by the pipeline.

/// Label prefix marking a pull-request label as a recipe selector.
pub const RECIPE_LABEL_PREFIX: &str = "run:";

/// Maximum length of the recipe portion of a job name, in characters.
pub const MAX_JOB_NAME_SEGMENT: usize = 44;

/// Feedstock subdirectory used when the runner config does not override it.
pub const DEFAULT_FEEDSTOCK_SUBDIR: &str = "feedstock";

/// Top-level runner config section that may carry `feedstock_subdir`.
pub const BASE_COMMAND_SECTION: &str = "BaseCommand";

/// Key inside [`BASE_COMMAND_SECTION`] naming the feedstock subdirectory.
pub const FEEDSTOCK_SUBDIR_KEY: &str = "feedstock_subdir";

/// Dependency manifest looked up in the feedstock subdirectory.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Default job-runner program.
pub const DEFAULT_RUNNER_PROGRAM: &str = "pangeo-forge-runner";

/// Runner subcommand that submits recipes.
pub const BAKE_SUBCOMMAND: &str = "bake";

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub REST API version requested on every call.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Media type requested from the GitHub REST API.
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "deploy-recipe";
