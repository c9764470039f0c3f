use crate::domain::models::credentials::Credentials;
use thiserror::Error;

pub const TOKEN_KEY: &str = "token";
pub const OWNER_KEY: &str = "ownerName";
pub const REPO_KEY: &str = "repoName";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access credential store at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode credentials: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable key-value storage for the last credentials triple that produced a successful fetch.
///
/// Last write wins. `load` never fails: missing keys come back as empty strings.
pub trait CredentialStore {
    fn load(&self) -> Credentials;
    fn save(&self, credentials: &Credentials) -> Result<(), StoreError>;
}
