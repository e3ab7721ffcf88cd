//! In-process backend holding a path → content map.
//!
//! Behaves like the cluster for the purposes of the sync engine: applies are
//! validated and committed all-or-nothing, and failures can be injected.

use super::FilesClient;
use crate::error::{SyncError, ValidationError};
use crate::store::SCHEMA_PATH;
use crate::tree::node::FileNode;
use crate::types::{FileChange, FileRecord, NodeKind};
use crate::validator::ValidatorSet;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Fake cluster file storage
pub struct InMemoryFilesClient {
    files: Mutex<BTreeMap<String, String>>,
    schema: Mutex<String>,
    validators: ValidatorSet,
    fail_next: Mutex<Option<SyncError>>,
    latency: Mutex<Option<Duration>>,
    apply_calls: Mutex<usize>,
}

impl Default for InMemoryFilesClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFilesClient {
    /// Empty backend validating YAML on apply
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            schema: Mutex::new(String::new()),
            validators: ValidatorSet::default(),
            fail_next: Mutex::new(None),
            latency: Mutex::new(None),
            apply_calls: Mutex::new(0),
        }
    }

    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let client = Self::new();
        {
            let mut map = client.files.lock();
            for (path, content) in files {
                map.insert(path.into(), content.into());
            }
        }
        client
    }

    pub fn with_schema(self, yaml: impl Into<String>) -> Self {
        *self.schema.lock() = yaml.into();
        self
    }

    pub fn with_validators(mut self, validators: ValidatorSet) -> Self {
        self.validators = validators;
        self
    }

    /// Make the next request fail with `error`
    pub fn fail_next(&self, error: SyncError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Delay every request by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Current server-side files
    pub fn files(&self) -> BTreeMap<String, String> {
        self.files.lock().clone()
    }

    /// Current server-side schema
    pub fn schema(&self) -> String {
        self.schema.lock().clone()
    }

    /// Number of apply requests received, successful or not
    pub fn apply_calls(&self) -> usize {
        *self.apply_calls.lock()
    }

    async fn round_trip(&self) -> Result<(), SyncError> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stage(&self, changes: &[FileChange]) -> Result<BTreeMap<String, String>, SyncError> {
        let mut staged = self.files.lock().clone();
        for change in changes {
            match &change.content {
                Some(content) => {
                    staged.insert(change.path.clone(), content.clone());
                }
                None => {
                    staged.remove(&change.path);
                }
            }
        }

        let errors: Vec<ValidationError> = changes
            .iter()
            .filter_map(|change| {
                let content = change.content.as_deref()?;
                let node = FileNode::new_synced(&change.path, NodeKind::File, content);
                self.validators.validate(&node)
            })
            .collect();
        if errors.is_empty() {
            Ok(staged)
        } else {
            Err(SyncError::Rejected(errors))
        }
    }

    fn check_schema_text(&self, yaml: &str) -> Result<(), SyncError> {
        let node = FileNode::new_synced(SCHEMA_PATH, NodeKind::File, yaml);
        match self.validators.validate(&node) {
            Some(error) => Err(SyncError::Rejected(vec![error])),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FilesClient for InMemoryFilesClient {
    async fn fetch_files(&self) -> Result<Vec<FileRecord>, SyncError> {
        self.round_trip().await?;
        Ok(self
            .files
            .lock()
            .iter()
            .map(|(path, content)| FileRecord::new(path.clone(), content.clone()))
            .collect())
    }

    async fn apply_files(&self, changes: &[FileChange]) -> Result<(), SyncError> {
        *self.apply_calls.lock() += 1;
        self.round_trip().await?;
        let staged = self.stage(changes)?;
        debug!(changes = changes.len(), "In-memory backend applied changes");
        *self.files.lock() = staged;
        Ok(())
    }

    async fn validate_files(&self, changes: &[FileChange]) -> Result<(), SyncError> {
        self.round_trip().await?;
        self.stage(changes).map(|_| ())
    }

    async fn fetch_schema(&self) -> Result<String, SyncError> {
        self.round_trip().await?;
        Ok(self.schema())
    }

    async fn check_schema(&self, yaml: &str) -> Result<(), SyncError> {
        self.round_trip().await?;
        self.check_schema_text(yaml)
    }

    async fn apply_schema(&self, yaml: &str) -> Result<(), SyncError> {
        self.round_trip().await?;
        self.check_schema_text(yaml)?;
        *self.schema.lock() = yaml.to_string();
        debug!(bytes = yaml.len(), "In-memory backend applied schema");
        Ok(())
    }
}
