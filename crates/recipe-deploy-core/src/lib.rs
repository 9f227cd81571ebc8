//! # recipe-deploy-core
//!
//! The deployment pipeline run by the `deploy-recipe` binary.
//!
//! Handles:
//! - **Runner config**: Inline JSON or JSON file resolution.
//! - **Labels**: Recipe selection from `run:` pull-request labels.
//! - **GitHub**: The one hosting API call the pipeline makes.
//! - **Deps**: Optional `requirements.txt` install before submission.
//! - **Submit**: Runner command construction and output parsing.
//! - **Process**: The seam all external programs are run through.
//! - **Pipeline**: The linear orchestration of the above.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod deps;
pub mod github;
pub mod labels;
pub mod pipeline;
pub mod process;
pub mod runner_config;
pub mod submit;
