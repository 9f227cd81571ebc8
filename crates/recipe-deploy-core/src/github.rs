//! GitHub REST API access.
//!
//! Only one endpoint is used: pull requests associated with a commit or
//! branch (`GET /repos/{repository}/commits/{ref}/pulls`).

use recipe_deploy_common::config::ActionSettings;
use recipe_deploy_common::constants::{BIN_NAME, GITHUB_API_VERSION, GITHUB_MEDIA_TYPE};
use recipe_deploy_common::error::{DeployError, Result};
use serde::Deserialize;

/// A pull-request label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    /// Label name as shown on the pull request.
    pub name: String,
}

/// The parts of a pull request the pipeline reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    /// Pull-request number.
    #[serde(default)]
    pub number: Option<u64>,
    /// Labels in the order the API returns them.
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Source of pull requests associated with a commit or branch.
pub trait PullRequestSource {
    /// Returns every pull request associated with `reference`.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::UpstreamApi` if the request fails, the API
    /// reports a failure status, or the body is not a pull-request list.
    fn pulls_for_ref(&self, reference: &str) -> Result<Vec<PullRequest>>;
}

/// Blocking GitHub REST client.
#[derive(Debug)]
pub struct GitHubClient {
    http: reqwest::blocking::Client,
    api_url: String,
    repository: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Creates a client for the repository named in `settings`.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::UpstreamApi` if the HTTP client cannot be built.
    pub fn new(settings: &ActionSettings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| DeployError::UpstreamApi {
                url: settings.api_url.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self::with_client(settings, http))
    }

    /// Creates a client that sends requests through `http`.
    #[must_use]
    pub fn with_client(settings: &ActionSettings, http: reqwest::blocking::Client) -> Self {
        Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_owned(),
            repository: settings.repository.clone(),
            token: settings.github_token.clone(),
        }
    }

    /// Returns the pulls endpoint URL for `reference`.
    #[must_use]
    pub fn pulls_url(&self, reference: &str) -> String {
        format!(
            "{}/repos/{}/commits/{reference}/pulls",
            self.api_url, self.repository
        )
    }
}

impl PullRequestSource for GitHubClient {
    fn pulls_for_ref(&self, reference: &str) -> Result<Vec<PullRequest>> {
        let url = self.pulls_url(reference);
        tracing::info!(url = %url, "fetching pull requests");

        let mut request = self
            .http
            .get(&url)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(reqwest::header::ACCEPT, GITHUB_MEDIA_TYPE)
            .header(
                reqwest::header::USER_AGENT,
                format!("{BIN_NAME}/{}", env!("CARGO_PKG_VERSION")),
            );
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| DeployError::UpstreamApi {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().map_err(|e| DeployError::UpstreamApi {
            url: url.clone(),
            message: format!("failed to read response body: {e}"),
        })?;
        if !status.is_success() {
            return Err(DeployError::UpstreamApi {
                url,
                message: format!("HTTP {status}: {body}"),
            });
        }

        serde_json::from_str(&body).map_err(|e| DeployError::UpstreamApi {
            url,
            message: format!("unexpected response body: {e}"),
        })
    }
}
