//! Configuration
//!
//! Layered settings for the cluster connection, the editor's name rules, and
//! logging. Sources, lowest precedence first: built-in defaults, the global
//! file under `$XDG_CONFIG_HOME/cfgtree/`, `cfgtree.toml` in the working
//! directory, then `CFGTREE__SECTION__KEY` environment variables.

mod facade;

pub mod merge {
    pub mod merge_policy;
    pub mod service;
}

pub mod paths {
    pub mod xdg_root;
}

pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::logging::LoggingConfig;
use crate::store::DEFAULT_IGNORED_PATHS;
use crate::tree::path::{NamePolicy, DEFAULT_MAX_NAME_LEN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the per-directory config file
pub const WORKSPACE_CONFIG_FILE: &str = "cfgtree.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "CFGTREE";

fn default_endpoint() -> String {
    "http://127.0.0.1:8081/admin/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_name_len() -> usize {
    DEFAULT_MAX_NAME_LEN
}

fn default_ignored_paths() -> Vec<String> {
    DEFAULT_IGNORED_PATHS.iter().map(|p| p.to_string()).collect()
}

fn default_debounce_ms() -> u64 {
    300
}

/// Connection to the cluster's admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// GraphQL endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token sent with every request
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            auth_token: None,
        }
    }
}

/// Editing rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    /// Extensions new files may carry; empty allows any
    #[serde(default)]
    pub allowed_extensions: Vec<String>,

    /// Server paths hidden from the tree
    #[serde(default = "default_ignored_paths")]
    pub ignored_paths: Vec<String>,

    /// Quiet period before buffered edits reach the store
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl EditorConfig {
    pub fn name_policy(&self) -> NamePolicy {
        NamePolicy {
            max_len: self.max_name_len,
            allowed_extensions: self.allowed_extensions.clone(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
            allowed_extensions: Vec::new(),
            ignored_paths: default_ignored_paths(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CfgTreeConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
