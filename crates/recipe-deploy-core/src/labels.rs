//! Recipe selection from pull-request labels.
//!
//! A label named `run:<recipe_id>` on the pull request that triggered the
//! run selects `<recipe_id>` for submission. Label order is preserved.

use recipe_deploy_common::config::ActionSettings;
use recipe_deploy_common::constants::{MAX_JOB_NAME_SEGMENT, RECIPE_LABEL_PREFIX};
use recipe_deploy_common::error::{DeployError, Result};
use recipe_deploy_common::types::RecipeId;

use crate::github::PullRequestSource;

/// Returns the reference used to find the triggering pull request.
///
/// The head branch on `pull_request` events; the commit SHA on `push`
/// events, where the head branch is empty.
#[must_use]
pub fn query_reference(settings: &ActionSettings) -> &str {
    if settings.head_ref.is_empty() {
        &settings.sha
    } else {
        &settings.head_ref
    }
}

/// Extracts recipe IDs from label names, in order.
///
/// Labels without the `run:` prefix are ignored.
pub fn recipe_ids_from_labels<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<RecipeId> {
    names
        .into_iter()
        .filter_map(|name| name.strip_prefix(RECIPE_LABEL_PREFIX))
        .map(RecipeId::new)
        .collect()
}

/// Resolves the recipes selected for this run.
///
/// Returns an empty list without touching the network when label
/// selection is off. Otherwise exactly one pull request must be associated
/// with the query reference.
///
/// # Errors
///
/// Returns `DeployError::UpstreamApi` if the lookup fails and
/// `DeployError::PullRequestCount` if it does not yield exactly one
/// pull request.
pub fn resolve_recipes(
    settings: &ActionSettings,
    source: &dyn PullRequestSource,
) -> Result<Vec<RecipeId>> {
    if !settings.select_recipe_by_label {
        tracing::debug!("label selection disabled");
        return Ok(Vec::new());
    }

    let reference = query_reference(settings);
    let pulls = source.pulls_for_ref(reference)?;
    let [pull] = pulls.as_slice() else {
        return Err(DeployError::PullRequestCount {
            reference: reference.to_owned(),
            count: pulls.len(),
        });
    };

    let recipes = recipe_ids_from_labels(pull.labels.iter().map(|l| l.name.as_str()));
    for recipe in recipes.iter().filter(|r| r.exceeds_segment_limit()) {
        tracing::warn!(
            recipe_id = %recipe,
            "recipe id is longer than {MAX_JOB_NAME_SEGMENT} chars, truncating in job name"
        );
    }
    tracing::info!(
        pull = ?pull.number,
        recipe_ids = ?recipes.iter().map(RecipeId::as_str).collect::<Vec<_>>(),
        "resolved recipes from labels"
    );
    Ok(recipes)
}
