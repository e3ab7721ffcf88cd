//! Remote file API contract.
//!
//! The sync engine only needs to fetch the full file set and push a change
//! set; server-side validation is optional. The DDL schema is edited apart
//! from the file tree as a single YAML document.

pub mod graphql;
pub mod memory;

use crate::error::SyncError;
use crate::types::{FileChange, FileRecord};
use async_trait::async_trait;

pub use graphql::GraphqlFilesClient;
pub use memory::InMemoryFilesClient;

/// Access to the cluster's configuration files
#[async_trait]
pub trait FilesClient: Send + Sync {
    /// Fetch every configuration file
    async fn fetch_files(&self) -> Result<Vec<FileRecord>, SyncError>;

    /// Apply a change set; the backend accepts all of it or none of it
    async fn apply_files(&self, changes: &[FileChange]) -> Result<(), SyncError>;

    /// Ask the backend whether a change set would be accepted
    async fn validate_files(&self, changes: &[FileChange]) -> Result<(), SyncError> {
        let _ = changes;
        Ok(())
    }

    /// Fetch the cluster's DDL schema as YAML
    async fn fetch_schema(&self) -> Result<String, SyncError>;

    /// Ask the backend whether a schema could be applied
    async fn check_schema(&self, yaml: &str) -> Result<(), SyncError>;

    /// Replace the cluster's DDL schema
    async fn apply_schema(&self, yaml: &str) -> Result<(), SyncError>;
}
