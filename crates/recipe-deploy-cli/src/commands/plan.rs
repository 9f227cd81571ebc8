//! `deploy-recipe plan` — Show what `deploy` would run.

use recipe_deploy_common::config::ActionSettings;
use recipe_deploy_core::pipeline::Deployer;

use crate::output;

/// Executes the `plan` command.
///
/// Resolves the config and labels (the hosting API is still queried when
/// label selection is on) but starts no subprocess.
///
/// # Errors
///
/// Returns an error if config, label, or feedstock resolution fails.
#[allow(clippy::print_stdout)]
pub fn execute(settings: ActionSettings) -> anyhow::Result<()> {
    let deployer = Deployer::new(settings)?;
    let plan = deployer.plan()?;
    print!("{}", output::format_plan(&plan));
    Ok(())
}
