//! Editing session
//!
//! One operator's view of the cluster's configuration files: the store, the
//! pending structural operation, the cached tree, and the sync engine behind
//! a single shareable handle.

pub mod edits;

use crate::config::{CfgTreeConfig, EditorConfig};
use crate::error::{ApiError, OpError, SyncError, ValidationError};
use crate::operation::{Confirmed, NameCheck, OperationController, OperationState};
use crate::store::{FileStore, SCHEMA_PATH};
use crate::sync::client::{FilesClient, GraphqlFilesClient};
use crate::sync::{ChangeSet, SyncEngine};
use crate::tree::hasher::Fingerprint;
use crate::tree::{FileNode, TreeBuilder, TreeNode};
use crate::types::{FileId, NodeKind};
use crate::validator::ValidatorSet;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub use edits::{EditBatcher, EditPump, EditSender};

/// Store, operation controller, and sync engine for one operator
///
/// Lock order is controller before store.
pub struct Session {
    store: RwLock<FileStore>,
    controller: RwLock<OperationController>,
    tree: Mutex<TreeBuilder>,
    sync: SyncEngine,
    validators: ValidatorSet,
    debounce: Duration,
}

impl Session {
    /// Empty session; call [`Session::reload`] to load the cluster's files
    pub fn new(client: Arc<dyn FilesClient>, editor: &EditorConfig) -> Self {
        Self {
            store: RwLock::new(FileStore::new()),
            controller: RwLock::new(OperationController::new(editor.name_policy())),
            tree: Mutex::new(TreeBuilder::new()),
            sync: SyncEngine::new(client, editor.ignored_paths.clone()),
            validators: ValidatorSet::default(),
            debounce: editor.debounce(),
        }
    }

    /// Session talking to the configured cluster endpoint
    pub fn from_config(config: &CfgTreeConfig) -> Result<Self, ApiError> {
        let client = GraphqlFilesClient::new(&config.cluster)?;
        Ok(Self::new(Arc::new(client), &config.editor))
    }

    pub fn with_validators(mut self, validators: ValidatorSet) -> Self {
        self.validators = validators;
        self
    }

    /// Start a pump that writes editor keystrokes after `editor.debounce_ms` of quiet
    pub fn spawn_edit_pump(self: &Arc<Self>) -> (EditSender, JoinHandle<()>) {
        EditPump::spawn(Arc::clone(self), self.debounce)
    }

    /// Current tree; rebuilt only when the store changed
    pub fn tree(&self) -> Arc<Vec<TreeNode>> {
        let nodes = Arc::clone(self.store.read().nodes());
        self.tree.lock().tree(&nodes)
    }

    /// Snapshot of the flat node list
    pub fn nodes(&self) -> Arc<Vec<FileNode>> {
        Arc::clone(self.store.read().nodes())
    }

    pub fn get_node(&self, file_id: FileId) -> Option<FileNode> {
        self.store.read().get(file_id).cloned()
    }

    pub fn find_by_path(&self, path: &str) -> Option<FileNode> {
        self.store.read().find_by_path(path).cloned()
    }

    pub fn create_file(&self, parent_path: &str, name: &str) -> Result<FileNode, OpError> {
        let state = OperationState::CreatingFile {
            parent_path: parent_path.to_string(),
        };
        match self.run_operation(state, name)? {
            Confirmed::Created(node) => Ok(node),
            _ => Err(OpError::NoPendingOperation),
        }
    }

    pub fn create_folder(&self, parent_path: &str, name: &str) -> Result<FileNode, OpError> {
        let state = OperationState::CreatingFolder {
            parent_path: parent_path.to_string(),
        };
        match self.run_operation(state, name)? {
            Confirmed::Created(node) => Ok(node),
            _ => Err(OpError::NoPendingOperation),
        }
    }

    /// Rename a node; returns the node and every descendant whose path changed
    pub fn rename(&self, file_id: FileId, new_name: &str) -> Result<Vec<FileNode>, OpError> {
        match self.run_operation(OperationState::Renaming { file_id }, new_name)? {
            Confirmed::Renamed(nodes) => Ok(nodes),
            _ => Err(OpError::NoPendingOperation),
        }
    }

    /// Delete a node and its subtree; returns the affected nodes
    pub fn delete(&self, file_id: FileId) -> Result<Vec<FileNode>, OpError> {
        match self.run_operation(OperationState::ConfirmingDelete { file_id }, "")? {
            Confirmed::Deleted(nodes) => Ok(nodes),
            _ => Err(OpError::NoPendingOperation),
        }
    }

    /// Begin, name, and confirm an operation in one step
    ///
    /// Fails with `OperationPending` while the operator has an operation
    /// open. A failed confirm leaves the controller idle.
    fn run_operation(&self, state: OperationState, name: &str) -> Result<Confirmed, OpError> {
        let mut controller = self.controller.write();
        let mut store = self.store.write();
        controller.begin(state, &store)?;
        controller.set_input(name, &store);
        let outcome = controller.confirm(&mut store);
        if outcome.is_err() {
            controller.cancel();
        }
        outcome
    }

    pub fn set_content(&self, file_id: FileId, text: &str) -> Result<FileNode, OpError> {
        self.store.write().set_content(file_id, text)
    }

    /// Start an interactive operation
    pub fn begin_operation(&self, state: OperationState) -> Result<(), OpError> {
        let mut controller = self.controller.write();
        controller.begin(state, &self.store.read())
    }

    pub fn operation_state(&self) -> OperationState {
        self.controller.read().state().clone()
    }

    /// Update the typed name of the pending operation and check it
    pub fn operation_input(&self, text: &str) -> NameCheck {
        let mut controller = self.controller.write();
        controller.set_input(text, &self.store.read())
    }

    pub fn confirm_operation(&self) -> Result<Confirmed, OpError> {
        let mut controller = self.controller.write();
        let mut store = self.store.write();
        controller.confirm(&mut store)
    }

    pub fn cancel_operation(&self) {
        self.controller.write().cancel();
    }

    /// Replace local state with the cluster's files, discarding unsaved changes
    pub async fn reload(&self) -> Result<usize, SyncError> {
        self.sync.reload(&self.store, &self.controller).await
    }

    /// Send every unsaved change to the cluster
    pub async fn apply(&self) -> Result<ChangeSet, SyncError> {
        self.sync.apply(&self.store).await
    }

    /// Syntax check of one file's current content
    pub fn validate(&self, file_id: FileId) -> Result<Option<ValidationError>, OpError> {
        let store = self.store.read();
        let node = store.get_live(file_id)?;
        Ok(self.validators.validate(node))
    }

    /// Syntax check of every live file
    pub fn validate_all(&self) -> Vec<ValidationError> {
        let nodes = self.nodes();
        self.validators.validate_all(nodes.iter())
    }

    /// Ask the cluster whether the pending changes would be accepted
    pub async fn validate_remote(&self) -> Result<(), SyncError> {
        self.sync.validate_remote(&self.store).await
    }

    /// The cluster's DDL schema as YAML
    pub async fn schema(&self) -> Result<String, SyncError> {
        self.sync.fetch_schema().await
    }

    /// Check a schema's syntax locally, then ask the cluster
    pub async fn check_schema(&self, yaml: &str) -> Result<(), SyncError> {
        self.check_schema_syntax(yaml)?;
        self.sync.check_schema(yaml).await
    }

    /// Replace the cluster's schema after a local syntax check
    pub async fn apply_schema(&self, yaml: &str) -> Result<(), SyncError> {
        self.check_schema_syntax(yaml)?;
        self.sync.apply_schema(yaml).await
    }

    fn check_schema_syntax(&self, yaml: &str) -> Result<(), SyncError> {
        let node = FileNode::new_synced(SCHEMA_PATH, NodeKind::File, yaml);
        match self.validators.validate(&node) {
            Some(error) => Err(SyncError::Rejected(vec![error])),
            None => Ok(()),
        }
    }

    /// What the next Apply would send
    pub fn pending_changes(&self) -> ChangeSet {
        ChangeSet::compute(self.store.read().nodes())
    }

    /// Nodes that differ from their synced state
    pub fn dirty_nodes(&self) -> Vec<FileNode> {
        self.store.read().dirty_nodes().into_iter().cloned().collect()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.read().has_dirty_nodes()
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_syncing()
    }

    /// Digest of the last-synced file set
    pub fn fingerprint(&self) -> Fingerprint {
        self.store.read().synced_fingerprint()
    }
}
