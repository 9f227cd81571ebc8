//! External program execution.
//!
//! Every subprocess the pipeline starts (the dependency installer and the
//! job runner) goes through [`CommandRunner`], so the invocation history
//! can be observed and scripted in tests.

use std::fmt;
use std::path::PathBuf;

use recipe_deploy_common::error::{DeployError, Result};

/// A fully built command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory; inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Creates a command with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Returns program and arguments as one argv vector.
    #[must_use]
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Exit code; `-1` when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Returns whether the command exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs commands to completion and captures their output.
pub trait CommandRunner {
    /// Runs `cmd`, blocking until it exits.
    ///
    /// A non-zero exit is not an error at this level; callers decide.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Spawn` if the program cannot be started.
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        let program = which::which(&cmd.program).map_err(|e| DeployError::Spawn {
            program: cmd.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e),
        })?;

        let mut command = std::process::Command::new(program);
        let _ = command.args(&cmd.args);
        if let Some(dir) = &cmd.cwd {
            let _ = command.current_dir(dir);
        }

        let output = command.output().map_err(|e| DeployError::Spawn {
            program: cmd.program.clone(),
            source: e,
        })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Runs `cmd` through `runner`, echoing its output to the log.
///
/// Stdout lines are always logged; stderr lines only when the command
/// failed.
///
/// # Errors
///
/// Propagates spawn failures from the runner.
pub fn run_logged(runner: &dyn CommandRunner, cmd: &CommandSpec) -> Result<CommandOutput> {
    tracing::info!(cmd = ?cmd.argv(), "calling subprocess");
    let output = runner.run(cmd)?;

    for line in output.stdout.lines() {
        tracing::info!(program = %cmd.program, "{line}");
    }
    if !output.success() {
        for line in output.stderr.lines() {
            tracing::error!(program = %cmd.program, "{line}");
        }
        tracing::error!(exit_code = output.exit_code, cmd = %cmd, "subprocess failed");
    }
    Ok(output)
}
