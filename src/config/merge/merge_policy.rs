//! Merge policy: the defaults layer every load starts from.

use crate::config::CfgTreeConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the serialized defaults, so every key exists before
/// any file or environment layer is merged over it.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&CfgTreeConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
