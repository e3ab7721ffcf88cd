//! Sync Engine
//!
//! Moves file state between the store and the cluster: Reload replaces the
//! store with the server's files, Apply sends the minimal change set and
//! commits what was sent. Only one of the two may run at a time.

pub mod client;
pub mod diff;

use crate::error::SyncError;
use crate::operation::OperationController;
use crate::store::FileStore;
use crate::types::FileChange;
use client::FilesClient;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use client::{GraphqlFilesClient, InMemoryFilesClient};
pub use diff::ChangeSet;

/// Holds the in-flight flag for the lifetime of one sync request
struct SyncGate<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SyncError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for SyncGate<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Reload/Apply coordinator
pub struct SyncEngine {
    client: Arc<dyn FilesClient>,
    in_flight: AtomicBool,
    ignored_paths: Vec<String>,
}

impl SyncEngine {
    pub fn new(client: Arc<dyn FilesClient>, ignored_paths: Vec<String>) -> Self {
        Self {
            client,
            in_flight: AtomicBool::new(false),
            ignored_paths,
        }
    }

    /// Whether a Reload or Apply is in flight
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Replace the store with the server's files and clear any pending operation
    ///
    /// Unsaved local changes are discarded. On failure the store is untouched.
    pub async fn reload(
        &self,
        store: &RwLock<FileStore>,
        controller: &RwLock<OperationController>,
    ) -> Result<usize, SyncError> {
        let _gate = SyncGate::acquire(&self.in_flight)?;
        let records = self.client.fetch_files().await.map_err(|e| {
            warn!(error = %e, "Reload failed");
            e
        })?;

        let fresh = FileStore::from_records(&records, &self.ignored_paths);
        let count = fresh.len();
        *store.write() = fresh;
        controller.write().reset();
        info!(files = records.len(), nodes = count, "Reloaded configuration files");
        Ok(count)
    }

    /// Send every pending change and mark it synced
    ///
    /// The change set is computed from a snapshot; edits made while the
    /// request is in flight stay dirty. An empty change set sends nothing.
    /// On failure the store is untouched.
    pub async fn apply(&self, store: &RwLock<FileStore>) -> Result<ChangeSet, SyncError> {
        let _gate = SyncGate::acquire(&self.in_flight)?;
        let snapshot = Arc::clone(store.read().nodes());
        let changes = ChangeSet::compute(&snapshot);

        if changes.is_empty() {
            debug!("Apply with no pending file changes");
        } else {
            info!(
                removals = changes.removals().count(),
                upserts = changes.upserts().count(),
                "Applying configuration changes"
            );
            self.client
                .apply_files(&changes.changes)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Apply failed, local changes kept");
                    e
                })?;
        }

        store.write().commit(&snapshot);
        info!(changes = changes.len(), "Apply committed");
        Ok(changes)
    }

    /// Ask the server whether the pending change set would be accepted
    pub async fn validate_remote(&self, store: &RwLock<FileStore>) -> Result<(), SyncError> {
        let changes: Vec<FileChange> = ChangeSet::compute(store.read().nodes()).changes;
        if changes.is_empty() {
            return Ok(());
        }
        self.client.validate_files(&changes).await
    }

    pub async fn fetch_schema(&self) -> Result<String, SyncError> {
        self.client.fetch_schema().await
    }

    pub async fn check_schema(&self, yaml: &str) -> Result<(), SyncError> {
        self.client.check_schema(yaml).await
    }

    /// Replace the cluster's schema; shares the in-flight gate with Apply
    pub async fn apply_schema(&self, yaml: &str) -> Result<(), SyncError> {
        let _gate = SyncGate::acquire(&self.in_flight)?;
        self.client.apply_schema(yaml).await.map_err(|e| {
            warn!(error = %e, "Schema apply failed");
            e
        })?;
        info!(bytes = yaml.len(), "Schema applied");
        Ok(())
    }
}
