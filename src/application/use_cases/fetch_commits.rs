use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::commit::CommitEntry;
use crate::domain::models::credentials::Credentials;
use crate::domain::repositories::credential_store::CredentialStore;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchCommitsError {
    /// token, owner or repo was empty; nothing was sent
    #[error("Missing data")]
    MissingInput,

    #[error("Failed to get commits")]
    FetchFailed(#[source] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct FetchCommitsUseCaseInput {
    pub credentials: Credentials,
}

#[derive(Debug, Clone)]
pub struct FetchCommitsUseCaseOutput {
    /// The triple that produced `commits`; this is what got persisted.
    pub credentials: Credentials,
    pub commits: Vec<CommitEntry>,
}

#[async_trait]
pub trait FetchCommitsUseCase {
    /// Credentials of the most recent successful fetch, as persisted.
    async fn saved_credentials(&self) -> Credentials;

    async fn execute(
        &self,
        input: FetchCommitsUseCaseInput,
    ) -> Result<FetchCommitsUseCaseOutput, FetchCommitsError>;
}

pub struct FetchCommitsInteractor<G, S>
where
    G: GitHubApi + Send + Sync + 'static,
    S: CredentialStore + Send + Sync + 'static,
{
    github_api: Arc<G>,
    credential_store: Arc<S>,
}

impl<G, S> FetchCommitsInteractor<G, S>
where
    G: GitHubApi + Send + Sync + 'static,
    S: CredentialStore + Send + Sync + 'static,
{
    pub fn new(github_api: Arc<G>, credential_store: Arc<S>) -> Self {
        Self {
            github_api,
            credential_store,
        }
    }
}

#[async_trait]
impl<G, S> FetchCommitsUseCase for FetchCommitsInteractor<G, S>
where
    G: GitHubApi + Send + Sync + 'static,
    S: CredentialStore + Send + Sync + 'static,
{
    async fn saved_credentials(&self) -> Credentials {
        // the store does blocking file I/O
        let store = self.credential_store.clone();
        tokio::task::spawn_blocking(move || store.load())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to load saved credentials: {}", e);
                Credentials::default()
            })
    }

    #[tracing::instrument(
        name = "FetchCommitsInteractor::execute",
        skip(self, input),
        fields(owner = %input.credentials.owner, repo = %input.credentials.repo)
    )]
    async fn execute(
        &self,
        input: FetchCommitsUseCaseInput,
    ) -> Result<FetchCommitsUseCaseOutput, FetchCommitsError> {
        let credentials = input.credentials;
        if !credentials.is_complete() {
            tracing::warn!("Token, owner or repo is empty, not fetching");
            return Err(FetchCommitsError::MissingInput);
        }

        tracing::info!("Fetching commits...");
        let commits = self
            .github_api
            .fetch_commits(&credentials)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch commits: {:#}", e);
                FetchCommitsError::FetchFailed(e)
            })?;
        tracing::info!("Fetched {} commits", commits.len());

        let store = self.credential_store.clone();
        let to_save = credentials.clone();
        match tokio::task::spawn_blocking(move || store.save(&to_save)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Fetched commits but could not persist credentials: {}", e);
            }
            Err(e) => {
                tracing::warn!("Credential save task failed: {}", e);
            }
        }

        Ok(FetchCommitsUseCaseOutput {
            credentials,
            commits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructures::adapters::secondary::storage::in_memory_credential_store::InMemoryCredentialStore;
    use crate::domain::repositories::credential_store::StoreError;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeGitHubApi {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeGitHubApi {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl GitHubApi for FakeGitHubApi {
        async fn fetch_commits(
            &self,
            _credentials: &Credentials,
        ) -> Result<Vec<CommitEntry>, anyhow::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("HTTP status server error (500 Internal Server Error)"));
            }
            Ok(vec![CommitEntry {
                message: "fix bug".to_string(),
                author_name: "Ann".to_string(),
                authored_at: None,
                sort_key: None,
            }])
        }
    }

    fn interactor(
        fail: bool,
        saved: Credentials,
    ) -> (
        FetchCommitsInteractor<FakeGitHubApi, InMemoryCredentialStore>,
        Arc<FakeGitHubApi>,
        Arc<InMemoryCredentialStore>,
    ) {
        let api = Arc::new(FakeGitHubApi::new(fail));
        let store = Arc::new(InMemoryCredentialStore::new(saved));
        (
            FetchCommitsInteractor::new(api.clone(), store.clone()),
            api,
            store,
        )
    }

    #[tokio::test]
    async fn test_incomplete_credentials_make_no_network_call() {
        let incomplete = [
            Credentials::new("", "o", "r"),
            Credentials::new("t", "", "r"),
            Credentials::new("t", "o", ""),
            Credentials::default(),
        ];

        for credentials in incomplete {
            let (interactor, api, store) = interactor(false, Credentials::default());

            let result = interactor
                .execute(FetchCommitsUseCaseInput { credentials })
                .await;

            assert!(matches!(result, Err(FetchCommitsError::MissingInput)));
            assert_eq!(api.calls.load(Ordering::SeqCst), 0);
            assert_eq!(store.save_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_success_persists_the_credentials_used() {
        let (interactor, api, store) =
            interactor(false, Credentials::new("old", "old-owner", "old-repo"));
        let used = Credentials::new("ghp_new", "octocat", "hello-world");

        let output = interactor
            .execute(FetchCommitsUseCaseInput {
                credentials: used.clone(),
            })
            .await
            .unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(output.commits.len(), 1);
        assert_eq!(output.credentials, used);
        assert_eq!(store.load(), used);
        assert_eq!(interactor.saved_credentials().await, used);
    }

    #[tokio::test]
    async fn test_failure_leaves_saved_credentials_untouched() {
        let saved = Credentials::new("old", "old-owner", "old-repo");
        let (interactor, api, store) = interactor(true, saved.clone());

        let result = interactor
            .execute(FetchCommitsUseCaseInput {
                credentials: Credentials::new("t", "o", "r"),
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, FetchCommitsError::FetchFailed(_)));
        assert_eq!(err.to_string(), "Failed to get commits");
        // the adapter's error stays reachable for logging
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("500"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.load(), saved);
        assert_eq!(store.save_count(), 0);
    }

    /// Store whose `save` blocks until the test signals it, or gives up after a timeout.
    struct GatedStore {
        gate: Mutex<std::sync::mpsc::Receiver<()>>,
        opened: AtomicBool,
    }

    impl CredentialStore for GatedStore {
        fn load(&self) -> Credentials {
            Credentials::default()
        }

        fn save(&self, _credentials: &Credentials) -> Result<(), StoreError> {
            let opened = self
                .gate
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(2))
                .is_ok();
            self.opened.store(opened, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_save_runs_off_the_runtime_thread() {
        let (open_gate, gate) = std::sync::mpsc::channel();
        let store = Arc::new(GatedStore {
            gate: Mutex::new(gate),
            opened: AtomicBool::new(false),
        });
        let interactor = FetchCommitsInteractor::new(Arc::new(FakeGitHubApi::new(false)), store.clone());

        // if save blocked the only runtime thread, the second future could not run until it timed out
        let (result, ()) = tokio::join!(
            interactor.execute(FetchCommitsUseCaseInput {
                credentials: Credentials::new("t", "o", "r"),
            }),
            async {
                tokio::task::yield_now().await;
                open_gate.send(()).unwrap();
            }
        );

        assert!(result.is_ok());
        assert!(store.opened.load(Ordering::SeqCst));
    }
}
