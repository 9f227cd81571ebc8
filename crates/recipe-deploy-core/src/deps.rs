//! Optional install of feedstock dependencies.
//!
//! A feedstock may ship a `requirements.txt` next to its recipes. When it
//! does, the file is installed before anything is submitted; a failed
//! install stops the run.

use std::path::{Path, PathBuf};

use recipe_deploy_common::constants::REQUIREMENTS_FILE;
use recipe_deploy_common::error::{DeployError, Result};

use crate::process::{self, CommandRunner, CommandSpec};

/// Returns whether the feedstock subdirectory directly contains a
/// `requirements.txt`.
///
/// Only the immediate directory listing is consulted.
///
/// # Errors
///
/// Returns `DeployError::Io` if the directory cannot be listed.
pub fn has_requirements(feedstock_dir: &Path) -> Result<bool> {
    let io_err = |e: std::io::Error| DeployError::Io {
        path: feedstock_dir.to_path_buf(),
        source: e,
    };
    for entry in std::fs::read_dir(feedstock_dir).map_err(io_err)? {
        if entry.map_err(io_err)?.file_name() == REQUIREMENTS_FILE {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Builds the install command for `<feedstock_subdir>/requirements.txt`.
///
/// Scoped to the named conda environment when one is given, otherwise to
/// the interpreter on `PATH`.
#[must_use]
pub fn install_command(feedstock_subdir: &str, conda_env: Option<&str>) -> CommandSpec {
    let requirements = format!("{feedstock_subdir}/{REQUIREMENTS_FILE}");
    match conda_env {
        Some(env) => CommandSpec::new("mamba")
            .args(["run", "-n", env, "pip", "install", "-Ur"])
            .arg(requirements),
        None => CommandSpec::new("python3")
            .args(["-m", "pip", "install", "-Ur"])
            .arg(requirements),
    }
}

/// Plans the install step: the command to run, if any.
///
/// # Errors
///
/// Returns `DeployError::Io` if the feedstock directory cannot be listed.
pub fn plan_install(
    workdir: &Path,
    feedstock_subdir: &str,
    conda_env: Option<&str>,
) -> Result<Option<CommandSpec>> {
    let feedstock_dir: PathBuf = workdir.join(feedstock_subdir);
    if !has_requirements(&feedstock_dir)? {
        tracing::debug!(dir = %feedstock_dir.display(), "no requirements.txt, skipping install");
        return Ok(None);
    }
    Ok(Some(
        install_command(feedstock_subdir, conda_env).current_dir(workdir),
    ))
}

/// Installs the feedstock's `requirements.txt` if it has one.
///
/// Returns the command that ran, or `None` when there was nothing to
/// install.
///
/// # Errors
///
/// Returns `DeployError::DependencyInstall` if the installer exits
/// non-zero, or a spawn/listing error.
pub fn install_requirements(
    runner: &dyn CommandRunner,
    workdir: &Path,
    feedstock_subdir: &str,
    conda_env: Option<&str>,
) -> Result<Option<CommandSpec>> {
    let Some(cmd) = plan_install(workdir, feedstock_subdir, conda_env)? else {
        return Ok(None);
    };

    tracing::info!(feedstock_subdir, "installing feedstock requirements");
    let output = process::run_logged(runner, &cmd)?;
    if !output.success() {
        return Err(DeployError::DependencyInstall {
            command: cmd.to_string(),
            stderr: output.stderr,
        });
    }
    Ok(Some(cmd))
}
