//! Domain primitive types used across the workspace.

use std::fmt;

use serde::Deserialize;

use crate::constants::MAX_JOB_NAME_SEGMENT;

/// A recipe identifier taken from a `run:` pull-request label.
///
/// Holds the raw identifier as written in the label; the job-name form is
/// derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipeId(String);

impl RecipeId {
    /// Creates a recipe ID from a raw label suffix.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the job-name segment drops characters.
    #[must_use]
    pub fn exceeds_segment_limit(&self) -> bool {
        self.normalized().chars().count() > MAX_JOB_NAME_SEGMENT
    }

    /// Returns the identifier normalized for use in a job name.
    ///
    /// Lower-cased, underscores replaced with hyphens, and cut to at most
    /// [`MAX_JOB_NAME_SEGMENT`] characters.
    #[must_use]
    pub fn job_name_segment(&self) -> String {
        self.normalized().chars().take(MAX_JOB_NAME_SEGMENT).collect()
    }

    fn normalized(&self) -> String {
        self.0.to_lowercase().replace('_', "-")
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable suffix appended to every job name of a CI run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobNameSuffix {
    /// Numeric repository identifier.
    pub repository_id: String,
    /// CI run identifier.
    pub run_id: String,
    /// CI run attempt counter.
    pub run_attempt: String,
}

impl JobNameSuffix {
    /// Builds the full job name for a recipe.
    #[must_use]
    pub fn job_name_for(&self, recipe: &RecipeId) -> String {
        format!("{}{self}", recipe.job_name_segment())
    }
}

impl fmt::Display for JobNameSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-{}-{}-{}", self.repository_id, self.run_id, self.run_attempt)
    }
}

/// Job identifiers reported by the runner for one submission.
///
/// Either field may be absent: some backends do not produce a job id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobResult {
    /// Backend job identifier.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Backend job name.
    #[serde(default)]
    pub job_name: Option<String>,
}
