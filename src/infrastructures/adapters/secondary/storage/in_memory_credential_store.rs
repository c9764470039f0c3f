use crate::domain::models::credentials::Credentials;
use crate::domain::repositories::credential_store::{CredentialStore, StoreError};
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<Credentials>,
    saves: Mutex<u32>,
}

impl InMemoryCredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> u32 {
        *self.saves.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Credentials {
        self.credentials
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        *self
            .credentials
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = credentials.clone();
        *self.saves.lock().unwrap_or_else(std::sync::PoisonError::into_inner) += 1;
        Ok(())
    }
}
