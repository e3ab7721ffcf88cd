//! cfgtree: staged editing of clusterwide configuration files
//!
//! A cluster's configuration is a flat set of path-keyed text files. This
//! crate presents it as a folder tree, stages creates, renames, deletes, and
//! content edits locally, and sends them back as a single atomic Apply.

pub mod config;
pub mod error;
pub mod logging;
pub mod operation;
pub mod session;
pub mod store;
pub mod sync;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod validator;

pub use error::{ApiError, OpError, SyncError, ValidationError};
pub use session::Session;
pub use types::{FileChange, FileId, FileRecord, NodeKind};
