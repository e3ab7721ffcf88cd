//! File and folder node records

use crate::tree::path::{file_name_of, join_path, parent_path};
use crate::types::{FileId, NodeKind};
use serde::{Deserialize, Serialize};

/// One file or folder of the virtual tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub file_id: FileId,
    pub path: String,
    pub file_name: String,
    pub kind: NodeKind,
    pub content: String,
    /// Content last confirmed to match the server
    pub initial_content: String,
    /// Path last confirmed on the server; `None` until the node is first applied
    pub initial_path: Option<String>,
    pub deleted: bool,
}

impl FileNode {
    /// A node created locally, not yet known to the server
    pub fn new_local(parent: &str, name: &str, kind: NodeKind) -> Self {
        Self {
            file_id: FileId::next(),
            path: join_path(parent, name),
            file_name: name.to_string(),
            kind,
            content: String::new(),
            initial_content: String::new(),
            initial_path: None,
            deleted: false,
        }
    }

    /// A node that mirrors server state
    pub fn new_synced(path: &str, kind: NodeKind, content: &str) -> Self {
        let content = match kind {
            NodeKind::File => content.to_string(),
            NodeKind::Folder => String::new(),
        };
        Self {
            file_id: FileId::next(),
            path: path.to_string(),
            file_name: file_name_of(path).to_string(),
            kind,
            initial_content: content.clone(),
            content,
            initial_path: Some(path.to_string()),
            deleted: false,
        }
    }

    pub fn parent_path(&self) -> &str {
        parent_path(&self.path)
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn is_file(&self) -> bool {
        !self.kind.is_folder()
    }

    /// Created locally and never applied
    pub fn is_pending_create(&self) -> bool {
        self.initial_path.is_none()
    }

    pub fn is_renamed(&self) -> bool {
        matches!(&self.initial_path, Some(initial) if *initial != self.path)
    }

    /// Content matches the server and the node is neither a pending create nor a pending delete
    pub fn saved(&self) -> bool {
        self.content == self.initial_content && !self.is_pending_create() && !self.deleted
    }

    /// Whether Apply has anything to send for this node
    pub fn is_dirty(&self) -> bool {
        if self.deleted {
            return !self.is_pending_create();
        }
        self.is_pending_create() || self.content != self.initial_content || self.is_renamed()
    }
}
