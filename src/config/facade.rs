//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::CfgTreeConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the standard sources for `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<CfgTreeConfig, ConfigError> {
        MergeService::load(workspace_root)
    }

    /// Load configuration from a specific file with the environment on top.
    pub fn load_from_file(path: &Path) -> Result<CfgTreeConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    /// Built-in defaults only.
    pub fn default() -> CfgTreeConfig {
        CfgTreeConfig::default()
    }
}
