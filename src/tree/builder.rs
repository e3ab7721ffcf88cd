//! Tree Builder
//!
//! Derives the ordered hierarchical view from the flat node list. The view is
//! a pure function of the list: the same list always yields the same shape
//! and ordering.

use crate::tree::node::FileNode;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// A node of the rendered tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub node: FileNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Depth-first walk, parents before children
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a TreeNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut dyn FnMut(&'a TreeNode, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }
}

/// Folders first, then by name
fn compare_nodes(a: &FileNode, b: &FileNode) -> Ordering {
    match (a.is_folder(), b.is_folder()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.file_name.cmp(&b.file_name),
    }
}

/// Build the ordered tree from a flat list, skipping deleted nodes
pub fn build_tree(nodes: &[FileNode]) -> Vec<TreeNode> {
    let live: Vec<&FileNode> = nodes.iter().filter(|n| !n.deleted).collect();
    let folder_paths: HashSet<&str> = live
        .iter()
        .filter(|n| n.is_folder())
        .map(|n| n.path.as_str())
        .collect();

    let mut by_parent: HashMap<&str, Vec<&FileNode>> = HashMap::new();
    for &node in &live {
        let mut parent = node.parent_path();
        if !parent.is_empty() && !folder_paths.contains(parent) {
            debug!(path = %node.path, "Parent folder missing, attaching node at root");
            parent = "";
        }
        by_parent.entry(parent).or_default().push(node);
    }

    nest(&by_parent, "")
}

fn nest(by_parent: &HashMap<&str, Vec<&FileNode>>, parent: &str) -> Vec<TreeNode> {
    let Some(children) = by_parent.get(parent) else {
        return Vec::new();
    };
    let mut sorted = children.clone();
    sorted.sort_by(|a, b| compare_nodes(a, b));
    sorted
        .into_iter()
        .map(|node| TreeNode {
            children: if node.is_folder() {
                nest(by_parent, &node.path)
            } else {
                Vec::new()
            },
            node: node.clone(),
        })
        .collect()
}

/// Memoizing tree builder keyed on the identity of the node list
#[derive(Default)]
pub struct TreeBuilder {
    cached: Option<(Arc<Vec<FileNode>>, Arc<Vec<TreeNode>>)>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self { cached: None }
    }

    /// Tree for `nodes`; rebuilt only when a different list is passed
    pub fn tree(&mut self, nodes: &Arc<Vec<FileNode>>) -> Arc<Vec<TreeNode>> {
        if let Some((list, tree)) = &self.cached {
            if Arc::ptr_eq(list, nodes) {
                return Arc::clone(tree);
            }
        }
        let tree = Arc::new(build_tree(nodes));
        self.cached = Some((Arc::clone(nodes), Arc::clone(&tree)));
        tree
    }
}
