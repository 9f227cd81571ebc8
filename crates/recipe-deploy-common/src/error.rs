//! Unified error type for the recipe deployment workspace.
//!
//! Every fatal condition of a run maps to exactly one variant. The CLI
//! wraps these in `anyhow` at the boundary; library code returns them
//! directly.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The config source named an existing file whose contents are not JSON.
    #[error("config source looked like a path ({path}) but parsing its contents failed: {source}")]
    ConfigFile {
        /// Path that was read.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The config source named an existing path that could not be read as a file.
    #[error("config source looked like a path ({path}) but reading it failed: {source}")]
    ConfigFileRead {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config source was treated as inline JSON and did not parse.
    #[error("config source treated as inline JSON but parsing failed: {source} (source: {text:?})")]
    ConfigInline {
        /// The offending source text.
        text: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The hosting API call failed or returned an unusable body.
    #[error("hosting API request to {url} failed: {message}")]
    UpstreamApi {
        /// Requested URL.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// The hosting API did not return exactly one pull request for a reference.
    #[error("expected exactly one pull request for {reference}, found {count}")]
    PullRequestCount {
        /// Commit SHA or branch the lookup was made for.
        reference: String,
        /// Number of pull requests returned.
        count: usize,
    },

    /// An external program could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The dependency install command exited non-zero.
    #[error("dependency install `{command}` failed: {stderr}")]
    DependencyInstall {
        /// Rendered command line.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A submission invocation exited non-zero.
    #[error("submission `{command}` failed: {stderr}")]
    Submission {
        /// Rendered command line.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A submission succeeded but its final output line is not a JSON object.
    #[error("malformed output from `{command}`: {reason}\n--- captured stdout ---\n{stdout}")]
    MalformedOutput {
        /// Rendered command line.
        command: String,
        /// Full captured standard output.
        stdout: String,
        /// Why the final line was rejected.
        reason: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DeployError>;
