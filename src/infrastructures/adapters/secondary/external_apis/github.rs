use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::commit::{CommitEntry, normalize_commits};
use crate::domain::models::credentials::Credentials;
use anyhow::{Context, Error};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const USER_AGENT: &str = "commit-dashboard-rust-app";

pub struct GitHubApiAdapter {
    client: Client,
    base_url: String,
}

impl GitHubApiAdapter {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn commits_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/commits", self.base_url, owner, repo)
    }
}

#[async_trait]
impl GitHubApi for GitHubApiAdapter {
    #[tracing::instrument(
        name = "GitHubApiAdapter::fetch_commits",
        skip(self, credentials),
        fields(owner = %credentials.owner, repo = %credentials.repo)
    )]
    async fn fetch_commits(&self, credentials: &Credentials) -> Result<Vec<CommitEntry>, Error> {
        let url = self.commits_url(&credentials.owner, &credentials.repo);

        // No retry here: a failure goes straight back to the user.
        let body: Value = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", credentials.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .with_context(|| format!("Failed to send request for {url}"))?
            .error_for_status()
            .with_context(|| format!("API returned an error for {url}"))?
            .json()
            .await
            .with_context(|| format!("Failed to deserialize response for {url}"))?;

        let commits = normalize_commits(&body);
        tracing::debug!("Normalized {} commits", commits.len());

        Ok(commits)
    }
}
