//! Error types for structural edits, synchronization, and the application layer.

use crate::types::FileId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from structural edits (create, rename, delete, content edits)
///
/// These are resolved locally and never reach the sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("'{name}' already exists in {}", display_parent(.parent))]
    NameCollision { parent: String, name: String },

    #[error("Illegal name '{name}': {reason}")]
    IllegalName { name: String, reason: String },

    #[error("Node not found: {0}")]
    NodeNotFound(FileId),

    #[error("Parent folder not found: {0}")]
    ParentNotFound(String),

    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Another operation is already pending")]
    OperationPending,

    #[error("No operation is pending")]
    NoPendingOperation,
}

fn display_parent(parent: &str) -> String {
    if parent.is_empty() {
        "the root folder".to_string()
    } else {
        format!("'{}'", parent)
    }
}

/// A located content error, suitable for an inline editor marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// File the error belongs to, when known
    pub path: Option<String>,
    pub message: String,
    /// 1-based line
    pub line: Option<u32>,
    /// 1-based column
    pub column: Option<u32>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}", path)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
                if let Some(column) = self.column {
                    write!(f, ":{}", column)?;
                }
            }
            write!(f, ": ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// Errors from Reload and Apply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("A reload or apply is already in progress")]
    Busy,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned an unexpected response: {0}")]
    Protocol(String),

    #[error("Configuration rejected: {}", join_errors(.0))]
    Rejected(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SyncError {
    /// Validation errors carried by a rejection, if any
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            SyncError::Rejected(errors) => errors,
            _ => &[],
        }
    }
}

/// Application-level errors (CLI, configuration, logging)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Operation(#[from] OpError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Edit pump has stopped")]
    PumpStopped,
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
