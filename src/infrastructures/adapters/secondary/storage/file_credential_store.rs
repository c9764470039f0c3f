use crate::domain::models::credentials::Credentials;
use crate::domain::repositories::credential_store::{
    CredentialStore, OWNER_KEY, REPO_KEY, StoreError, TOKEN_KEY,
};
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Credential store backed by a JSON object of string keys on disk.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_entries(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "Credential file is not a JSON object, ignoring it");
                Ok(Map::new())
            }
        }
    }
}

impl CredentialStore for FileCredentialStore {
    #[tracing::instrument(name = "FileCredentialStore::load", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Credentials {
        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read saved credentials: {}", e);
                Map::new()
            }
        };

        let value_of = |key: &str| {
            entries
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Credentials {
            token: value_of(TOKEN_KEY),
            owner: value_of(OWNER_KEY),
            repo: value_of(REPO_KEY),
        }
    }

    #[tracing::instrument(name = "FileCredentialStore::save", skip(self, credentials), fields(path = %self.path.display()))]
    fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        // keys written by something else are kept; an unreadable file is left alone
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), Value::from(credentials.token.as_str()));
        entries.insert(OWNER_KEY.to_string(), Value::from(credentials.owner.as_str()));
        entries.insert(REPO_KEY.to_string(), Value::from(credentials.repo.as_str()));

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        let encoded = serde_json::to_string_pretty(&Value::Object(entries))?;

        // each save gets its own temp file in the target directory, then renames it into place
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        tmp.write_all(encoded.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        tracing::debug!("Saved credentials for {}/{}", credentials.owner, credentials.repo);
        Ok(())
    }
}
