//! Change sets: the minimal complete diff between local and last-synced state

use crate::tree::node::FileNode;
use crate::types::FileChange;
use serde::Serialize;
use std::collections::BTreeMap;

/// The payload of one Apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub changes: Vec<FileChange>,
}

impl ChangeSet {
    /// Diff the files of `nodes` against their last-synced state
    ///
    /// Removals cover every synced path no longer held by a live file
    /// (deleted, or renamed away). Upserts cover every live file whose
    /// content differs from what the server holds at its current path
    /// (created, edited, or renamed in). Folders have no server
    /// representation and never appear. Both groups are sorted by path,
    /// removals first.
    pub fn compute(nodes: &[FileNode]) -> Self {
        let synced: BTreeMap<&str, &str> = nodes
            .iter()
            .filter(|n| n.is_file())
            .filter_map(|n| {
                n.initial_path
                    .as_deref()
                    .map(|path| (path, n.initial_content.as_str()))
            })
            .collect();
        let current: BTreeMap<&str, &str> = nodes
            .iter()
            .filter(|n| n.is_file() && !n.deleted)
            .map(|n| (n.path.as_str(), n.content.as_str()))
            .collect();

        let mut changes: Vec<FileChange> = synced
            .keys()
            .filter(|path| !current.contains_key(*path))
            .map(|path| FileChange::remove(*path))
            .collect();
        changes.extend(
            current
                .iter()
                .filter(|(path, content)| synced.get(*path) != Some(*content))
                .map(|(path, content)| FileChange::upsert(*path, *content)),
        );

        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn removals(&self) -> impl Iterator<Item = &FileChange> {
        self.changes.iter().filter(|c| c.is_removal())
    }

    pub fn upserts(&self) -> impl Iterator<Item = &FileChange> {
        self.changes.iter().filter(|c| !c.is_removal())
    }
}
