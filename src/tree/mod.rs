//! Virtual file tree: node records, path index, and the derived tree view.

pub mod builder;
pub mod hasher;
pub mod node;
pub mod path;

pub use builder::{build_tree, TreeBuilder, TreeNode};
pub use hasher::{synced_fingerprint, Fingerprint};
pub use node::FileNode;
pub use path::NamePolicy;
