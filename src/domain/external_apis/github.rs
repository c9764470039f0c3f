use crate::domain::models::commit::CommitEntry;
use crate::domain::models::credentials::Credentials;
use anyhow::Error;
use async_trait::async_trait;

#[async_trait]
pub trait GitHubApi {
    /// Fetches the commit list of `credentials.owner/credentials.repo`, authorized with `credentials.token`.
    async fn fetch_commits(&self, credentials: &Credentials) -> Result<Vec<CommitEntry>, Error>;
}
