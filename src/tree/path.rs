//! Path index: pure functions over slash-delimited node paths
//!
//! The root folder is the empty path `""`. A node's path is always
//! `parent_path + "/" + file_name`, or just `file_name` at the root.

use crate::error::OpError;
use serde::{Deserialize, Serialize};

/// Path of the parent folder (`""` for root-level nodes)
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of a path
pub fn file_name_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Whether `path` lies strictly below `ancestor`
///
/// A path is not its own descendant, and a shared string prefix is not
/// enough: `"conf/a-b.yml"` is not below `"conf/a"`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len() + 1
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Replace the `old_prefix` folder at the start of `path` with `new_prefix`
///
/// Callers guarantee `path == old_prefix` or `is_descendant(path, old_prefix)`.
pub fn replace_prefix(path: &str, old_prefix: &str, new_prefix: &str) -> String {
    format!("{}{}", new_prefix, &path[old_prefix.len()..])
}

/// Non-empty segments of a path
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Drop empty segments (leading, trailing, or doubled slashes)
pub fn normalize_path(path: &str) -> String {
    split_segments(path).join("/")
}

/// Longest name the cluster accepts
pub const DEFAULT_MAX_NAME_LEN: usize = 32;

fn default_max_len() -> usize {
    DEFAULT_MAX_NAME_LEN
}

/// Rules for node names typed by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePolicy {
    /// Maximum name length in characters
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Allowed file extensions without the dot; empty allows any
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            allowed_extensions: Vec::new(),
        }
    }
}

fn is_legal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

impl NamePolicy {
    /// Check the character set and length of a file or folder name
    pub fn check_name(&self, name: &str) -> Result<(), OpError> {
        let illegal = |reason: &str| OpError::IllegalName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(illegal("name cannot be empty"));
        }
        if name == "." || name == ".." {
            return Err(illegal("reserved name"));
        }
        if let Some(c) = name.chars().find(|c| !is_legal_char(*c)) {
            return Err(illegal(&format!(
                "character {:?} is not allowed (use letters, digits, '-', '_', '.')",
                c
            )));
        }
        if name.chars().count() > self.max_len {
            return Err(illegal(&format!(
                "longer than {} characters",
                self.max_len
            )));
        }
        Ok(())
    }

    /// Check a file name's last extension against the allow-list
    pub fn check_extension(&self, name: &str) -> Result<(), OpError> {
        if self.allowed_extensions.is_empty() {
            return Ok(());
        }
        let ext = match name.rfind('.') {
            Some(idx) => &name[idx + 1..],
            None => "",
        };
        if self.allowed_extensions.iter().any(|allowed| allowed == ext) {
            Ok(())
        } else {
            Err(OpError::IllegalName {
                name: name.to_string(),
                reason: format!(
                    "extension must be one of: {}",
                    self.allowed_extensions.join(", ")
                ),
            })
        }
    }
}
