//! File Store
//!
//! Authoritative in-memory collection of file and folder nodes. Every
//! operation builds a new node list and swaps it in only on success, so a
//! failed operation leaves the store, including the identity of its list,
//! untouched.

use crate::error::OpError;
use crate::tree::hasher::{synced_fingerprint, Fingerprint};
use crate::tree::node::FileNode;
use crate::tree::path::{file_name_of, is_descendant, join_path, replace_prefix, split_segments};
use crate::types::{FileId, FileRecord, NodeKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Where the cluster exposes its DDL schema among the configuration files
pub const SCHEMA_PATH: &str = "schema.yml";

/// Paths the cluster reports that are never shown in the tree
pub const DEFAULT_IGNORED_PATHS: &[&str] = &[SCHEMA_PATH];

/// In-memory store of file nodes
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    nodes: Arc<Vec<FileNode>>,
}

impl FileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(Vec::new()),
        }
    }

    /// Build a synced store from server records
    ///
    /// Every path prefix becomes a folder node. Records for ignored paths and
    /// records whose path conflicts with an earlier entry are skipped.
    pub fn from_records(records: &[FileRecord], ignored_paths: &[String]) -> Self {
        let mut nodes: Vec<FileNode> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        'records: for record in records {
            let segments = split_segments(&record.path);
            if segments.is_empty() {
                warn!(path = %record.path, "Skipping record with empty path");
                continue;
            }
            let path = segments.join("/");
            if ignored_paths.iter().any(|ignored| *ignored == path) {
                debug!(path = %path, "Skipping ignored path");
                continue;
            }

            let mut current = String::new();
            for (i, segment) in segments.iter().enumerate() {
                current = join_path(&current, segment);
                let is_last = i + 1 == segments.len();
                let kind = if is_last {
                    NodeKind::File
                } else {
                    NodeKind::Folder
                };
                match index.get(&current) {
                    Some(&existing) if nodes[existing].kind == kind && !is_last => {}
                    Some(_) => {
                        warn!(path = %record.path, conflict = %current, "Skipping conflicting record");
                        continue 'records;
                    }
                    None => {
                        index.insert(current.clone(), nodes.len());
                        nodes.push(FileNode::new_synced(&current, kind, &record.content));
                    }
                }
            }
        }

        Self {
            nodes: Arc::new(nodes),
        }
    }

    /// Current node list; the `Arc` identity changes on every successful mutation
    pub fn nodes(&self) -> &Arc<Vec<FileNode>> {
        &self.nodes
    }

    /// Nodes not marked deleted
    pub fn live_nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.iter().filter(|n| !n.deleted)
    }

    /// Total node count, including pending deletes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, file_id: FileId) -> Option<&FileNode> {
        self.nodes.iter().find(|n| n.file_id == file_id)
    }

    /// Get a node that is not deleted, or fail with `NodeNotFound`
    pub fn get_live(&self, file_id: FileId) -> Result<&FileNode, OpError> {
        self.get(file_id)
            .filter(|n| !n.deleted)
            .ok_or(OpError::NodeNotFound(file_id))
    }

    pub fn find_by_path(&self, path: &str) -> Option<&FileNode> {
        self.live_nodes().find(|n| n.path == path)
    }

    /// Whether a live node named `name` sits in `parent`, ignoring `except`
    pub fn name_exists(&self, parent: &str, name: &str, except: Option<FileId>) -> bool {
        let path = join_path(parent, name);
        self.live_nodes()
            .any(|n| n.path == path && Some(n.file_id) != except)
    }

    pub fn create_file(&mut self, parent: &str, name: &str) -> Result<FileNode, OpError> {
        self.create(parent, name, NodeKind::File)
    }

    pub fn create_folder(&mut self, parent: &str, name: &str) -> Result<FileNode, OpError> {
        self.create(parent, name, NodeKind::Folder)
    }

    fn create(&mut self, parent: &str, name: &str, kind: NodeKind) -> Result<FileNode, OpError> {
        self.check_parent(parent)?;
        if self.name_exists(parent, name, None) {
            return Err(OpError::NameCollision {
                parent: parent.to_string(),
                name: name.to_string(),
            });
        }

        let node = FileNode::new_local(parent, name, kind);
        let mut next = (*self.nodes).clone();
        next.push(node.clone());
        self.nodes = Arc::new(next);
        debug!(path = %node.path, kind = ?kind, file_id = %node.file_id, "Created node");
        Ok(node)
    }

    fn check_parent(&self, parent: &str) -> Result<(), OpError> {
        if parent.is_empty() {
            return Ok(());
        }
        match self.find_by_path(parent) {
            Some(node) if node.is_folder() => Ok(()),
            Some(_) => Err(OpError::NotAFolder(parent.to_string())),
            None => Err(OpError::ParentNotFound(parent.to_string())),
        }
    }

    /// Rename a node in place, rewriting the paths of all live descendants
    ///
    /// Returns the nodes whose path changed; renaming to the current name
    /// changes nothing and returns an empty list.
    pub fn rename_node(&mut self, file_id: FileId, new_name: &str) -> Result<Vec<FileNode>, OpError> {
        let target = self.get_live(file_id)?;
        if target.file_name == new_name {
            return Ok(Vec::new());
        }
        let parent = target.parent_path().to_string();
        if self.name_exists(&parent, new_name, Some(file_id)) {
            return Err(OpError::NameCollision {
                parent,
                name: new_name.to_string(),
            });
        }

        let old_path = target.path.clone();
        let new_path = join_path(&parent, new_name);
        let cascade = target.is_folder();

        let mut changed = Vec::new();
        let next: Vec<FileNode> = self
            .nodes
            .iter()
            .map(|node| {
                if node.file_id == file_id {
                    let mut renamed = node.clone();
                    renamed.path = new_path.clone();
                    renamed.file_name = new_name.to_string();
                    changed.push(renamed.clone());
                    renamed
                } else if cascade && !node.deleted && is_descendant(&node.path, &old_path) {
                    let mut moved = node.clone();
                    moved.path = replace_prefix(&node.path, &old_path, &new_path);
                    moved.file_name = file_name_of(&moved.path).to_string();
                    changed.push(moved.clone());
                    moved
                } else {
                    node.clone()
                }
            })
            .collect();
        self.nodes = Arc::new(next);
        debug!(from = %old_path, to = %new_path, changed = changed.len(), "Renamed node");
        Ok(changed)
    }

    /// Delete a node and its live descendants
    ///
    /// Nodes that were never applied are purged; synced nodes are marked
    /// deleted and kept until Apply or Reload resolves them.
    pub fn delete_node(&mut self, file_id: FileId) -> Result<Vec<FileNode>, OpError> {
        let target = self.get_live(file_id)?;
        let root_path = target.path.clone();

        let mut affected = Vec::new();
        let mut next = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.iter() {
            let hit = node.file_id == file_id
                || (!node.deleted && is_descendant(&node.path, &root_path));
            if !hit {
                next.push(node.clone());
                continue;
            }
            let mut gone = node.clone();
            gone.deleted = true;
            if !gone.is_pending_create() {
                next.push(gone.clone());
            }
            affected.push(gone);
        }
        self.nodes = Arc::new(next);
        debug!(path = %root_path, affected = affected.len(), "Deleted node");
        Ok(affected)
    }

    /// Replace a file's content
    pub fn set_content(&mut self, file_id: FileId, text: &str) -> Result<FileNode, OpError> {
        let target = self.get_live(file_id)?;
        if target.is_folder() {
            return Err(OpError::NotAFile(target.path.clone()));
        }
        if target.content == text {
            return Ok(target.clone());
        }

        let mut updated = None;
        let next: Vec<FileNode> = self
            .nodes
            .iter()
            .map(|node| {
                if node.file_id == file_id {
                    let mut edited = node.clone();
                    edited.content = text.to_string();
                    updated = Some(edited.clone());
                    edited
                } else {
                    node.clone()
                }
            })
            .collect();
        self.nodes = Arc::new(next);
        updated.ok_or(OpError::NodeNotFound(file_id))
    }

    pub fn is_dirty(node: &FileNode) -> bool {
        node.is_dirty()
    }

    /// Nodes with changes for the next Apply
    pub fn dirty_nodes(&self) -> Vec<&FileNode> {
        self.nodes.iter().filter(|n| n.is_dirty()).collect()
    }

    pub fn has_dirty_nodes(&self) -> bool {
        self.nodes.iter().any(|n| n.is_dirty())
    }

    /// Digest of the server-confirmed file set
    pub fn synced_fingerprint(&self) -> Fingerprint {
        synced_fingerprint(&self.nodes)
    }

    /// Mark the state captured in `snapshot` as confirmed by the server
    ///
    /// Snapshotted deleted nodes are purged; every other snapshotted node
    /// takes the snapshot's content and path as its synced state. Nodes
    /// created or edited after the snapshot keep their pending changes.
    /// A node that was sent but purged from the store in the meantime comes
    /// back as a pending delete, so the next Apply removes it remotely.
    pub(crate) fn commit(&mut self, snapshot: &[FileNode]) {
        let confirmed: HashMap<FileId, &FileNode> =
            snapshot.iter().map(|n| (n.file_id, n)).collect();
        let purged: HashSet<FileId> = snapshot
            .iter()
            .filter(|n| n.deleted)
            .map(|n| n.file_id)
            .collect();

        let mut next: Vec<FileNode> = self
            .nodes
            .iter()
            .filter(|n| !purged.contains(&n.file_id))
            .map(|node| match confirmed.get(&node.file_id) {
                Some(sent) => {
                    let mut synced = node.clone();
                    synced.initial_content = sent.content.clone();
                    synced.initial_path = Some(sent.path.clone());
                    synced
                }
                None => node.clone(),
            })
            .collect();

        let present: HashSet<FileId> = next.iter().map(|n| n.file_id).collect();
        for sent in snapshot.iter().filter(|n| !n.deleted && !present.contains(&n.file_id)) {
            let mut tombstone = sent.clone();
            tombstone.initial_content = sent.content.clone();
            tombstone.initial_path = Some(sent.path.clone());
            tombstone.deleted = true;
            debug!(path = %sent.path, "Restored node removed during Apply as pending delete");
            next.push(tombstone);
        }
        self.nodes = Arc::new(next);
    }
}
