//! `deploy-recipe deploy` — Install requirements and submit recipes.

use recipe_deploy_common::config::ActionSettings;
use recipe_deploy_core::pipeline::Deployer;

use crate::output;

/// Executes the `deploy` command.
///
/// Prints one line per accepted submission once all of them succeeded.
///
/// # Errors
///
/// Returns an error if any stage of the pipeline fails.
#[allow(clippy::print_stdout)]
pub fn execute(settings: ActionSettings) -> anyhow::Result<()> {
    let deployer = Deployer::new(settings)?;
    let reports = deployer.deploy()?;
    for report in &reports {
        println!("{}", output::format_report(report));
    }
    Ok(())
}
