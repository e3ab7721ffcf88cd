//! Tooling
//!
//! The `cfgtree` command-line interface and its text formatting.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, SchemaCommands};
