pub mod file_credential_store;
pub mod in_memory_credential_store;
