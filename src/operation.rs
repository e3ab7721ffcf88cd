//! Operation Controller
//!
//! Single-slot state machine for the one structural edit the operator may
//! have in progress: creating a file or folder, renaming, or confirming a
//! delete. Name checks run on every input change without touching the store;
//! the store is mutated only on confirm.

use crate::error::OpError;
use crate::store::FileStore;
use crate::tree::node::FileNode;
use crate::tree::path::NamePolicy;
use crate::types::FileId;
use tracing::{debug, warn};

/// The pending structural edit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationState {
    #[default]
    Idle,
    CreatingFile { parent_path: String },
    CreatingFolder { parent_path: String },
    Renaming { file_id: FileId },
    ConfirmingDelete { file_id: FileId },
}

impl OperationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }
}

/// Live result of checking the typed name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameCheck {
    /// Empty, too long, reserved, bad characters, or bad extension
    pub illegal: bool,
    /// A live sibling already has this name
    pub exists: bool,
}

impl NameCheck {
    pub fn is_ok(&self) -> bool {
        !self.illegal && !self.exists
    }
}

/// What a confirmed operation did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmed {
    Created(FileNode),
    Renamed(Vec<FileNode>),
    Deleted(Vec<FileNode>),
}

/// Holder of the current operation and its typed input
#[derive(Debug, Clone, Default)]
pub struct OperationController {
    state: OperationState,
    input: String,
    policy: NamePolicy,
}

impl OperationController {
    pub fn new(policy: NamePolicy) -> Self {
        Self {
            state: OperationState::Idle,
            input: String::new(),
            policy,
        }
    }

    pub fn state(&self) -> &OperationState {
        &self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn policy(&self) -> &NamePolicy {
        &self.policy
    }

    /// Enter an operation; fails when another one is pending
    ///
    /// Renames start with the node's current name as input.
    pub fn begin(&mut self, state: OperationState, store: &FileStore) -> Result<(), OpError> {
        if !self.state.is_idle() {
            warn!(current = ?self.state, requested = ?state, "Rejected operation while another is pending");
            return Err(OpError::OperationPending);
        }
        self.input = match &state {
            OperationState::Idle => return Ok(()),
            OperationState::Renaming { file_id } => store.get_live(*file_id)?.file_name.clone(),
            OperationState::ConfirmingDelete { file_id } => {
                store.get_live(*file_id)?;
                String::new()
            }
            OperationState::CreatingFile { .. } | OperationState::CreatingFolder { .. } => {
                String::new()
            }
        };
        debug!(state = ?state, "Operation started");
        self.state = state;
        Ok(())
    }

    /// Update the typed name and re-check it
    pub fn set_input(&mut self, text: &str, store: &FileStore) -> NameCheck {
        self.input = text.to_string();
        self.check(store)
    }

    /// Check the current input against the name policy and its siblings
    pub fn check(&self, store: &FileStore) -> NameCheck {
        match &self.state {
            OperationState::Idle | OperationState::ConfirmingDelete { .. } => NameCheck::default(),
            OperationState::CreatingFile { parent_path } => NameCheck {
                illegal: self.legality(&self.input, true).is_err(),
                exists: store.name_exists(parent_path, &self.input, None),
            },
            OperationState::CreatingFolder { parent_path } => NameCheck {
                illegal: self.legality(&self.input, false).is_err(),
                exists: store.name_exists(parent_path, &self.input, None),
            },
            OperationState::Renaming { file_id } => match store.get_live(*file_id) {
                Ok(node) => NameCheck {
                    illegal: self.legality(&self.input, node.is_file()).is_err(),
                    exists: store.name_exists(node.parent_path(), &self.input, Some(*file_id)),
                },
                Err(_) => NameCheck {
                    illegal: true,
                    exists: false,
                },
            },
        }
    }

    fn legality(&self, name: &str, is_file: bool) -> Result<(), OpError> {
        self.policy.check_name(name)?;
        if is_file {
            self.policy.check_extension(name)?;
        }
        Ok(())
    }

    /// Apply the pending operation to the store
    ///
    /// On success the controller returns to idle. On failure the state and
    /// input are kept so the operator can correct the name.
    pub fn confirm(&mut self, store: &mut FileStore) -> Result<Confirmed, OpError> {
        let outcome = match &self.state {
            OperationState::Idle => return Err(OpError::NoPendingOperation),
            OperationState::CreatingFile { parent_path } => {
                self.legality(&self.input, true)?;
                Confirmed::Created(store.create_file(parent_path, &self.input)?)
            }
            OperationState::CreatingFolder { parent_path } => {
                self.legality(&self.input, false)?;
                Confirmed::Created(store.create_folder(parent_path, &self.input)?)
            }
            OperationState::Renaming { file_id } => {
                let is_file = store.get_live(*file_id)?.is_file();
                self.legality(&self.input, is_file)?;
                Confirmed::Renamed(store.rename_node(*file_id, &self.input)?)
            }
            OperationState::ConfirmingDelete { file_id } => {
                Confirmed::Deleted(store.delete_node(*file_id)?)
            }
        };
        debug!(state = ?self.state, "Operation confirmed");
        self.reset();
        Ok(outcome)
    }

    /// Discard the pending operation
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            debug!(state = ?self.state, "Operation cancelled");
        }
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = OperationState::Idle;
        self.input.clear();
    }
}
