//! CLI Tooling
//!
//! Command-line access to the cluster's configuration files: inspect the
//! remote tree, mirror it to a local directory, and push a local directory
//! back as one atomic Apply.

use crate::config::{CfgTreeConfig, ConfigLoader};
use crate::error::{ApiError, OpError, SyncError};
use crate::logging::LoggingConfig;
use crate::session::Session;
use crate::sync::client::FilesClient;
use crate::tooling::format::{
    format_change_table, format_section_heading, format_tree, format_validation_errors,
};
use crate::tree::hasher::short_hex;
use crate::tree::path::{join_path, normalize_path, split_segments};
use crate::types::NodeKind;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// cfgtree - staged editing of clusterwide configuration files
#[derive(Parser)]
#[command(name = "cfgtree")]
#[command(about = "Browse, pull, and push a cluster's configuration files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory searched for cfgtree.toml
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cluster admin API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the remote file tree
    Tree,
    /// Print one remote file
    Cat {
        /// File path, e.g. `roles/custom.yml`
        path: String,
    },
    /// Check remote files, or a local directory staged over them
    Validate {
        /// Local directory to stage before validating
        dir: Option<PathBuf>,
    },
    /// Write every remote file into a local directory
    Pull {
        /// Destination directory
        dir: PathBuf,
    },
    /// Stage a local directory onto the remote tree and apply it
    Push {
        /// Source directory
        dir: PathBuf,
        /// Delete remote files that are missing locally
        #[arg(long)]
        prune: bool,
        /// Show the pending changes without applying
        #[arg(long)]
        dry_run: bool,
        /// Apply without asking for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// DDL schema commands (show, check, apply)
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Print the cluster's schema
    Show,
    /// Check a local schema file against the cluster
    Check {
        /// Schema YAML file
        file: PathBuf,
    },
    /// Replace the cluster's schema with a local file
    Apply {
        /// Schema YAML file
        file: PathBuf,
        /// Apply without asking for confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// What staging a local directory changed in the session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub folders_created: usize,
    pub files_created: usize,
    pub files_updated: usize,
    pub files_deleted: usize,
}

/// CLI context holding the session and the runtime that drives it
pub struct CliContext {
    config: CfgTreeConfig,
    session: Arc<Session>,
    runtime: tokio::runtime::Runtime,
}

impl CliContext {
    /// Load configuration, apply command-line overrides, and connect
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = match &cli.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&cli.workspace)?,
        };
        apply_overrides(&mut config, cli);
        let session = Session::from_config(&config)?;
        Self::from_parts(config, session)
    }

    /// Context over an explicit backend
    pub fn with_client(config: CfgTreeConfig, client: Arc<dyn FilesClient>) -> Result<Self, ApiError> {
        let session = Session::new(client, &config.editor);
        Self::from_parts(config, session)
    }

    fn from_parts(config: CfgTreeConfig, session: Session) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            config,
            session: Arc::new(session),
            runtime,
        })
    }

    pub fn config(&self) -> &CfgTreeConfig {
        &self.config
    }

    pub fn logging_config(&self) -> &LoggingConfig {
        &self.config.logging
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Execute a CLI command
    ///
    /// File commands start from a fresh Reload; schema commands do not touch the tree.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        if !matches!(command, Commands::Schema { .. }) {
            let count = self.runtime.block_on(self.session.reload())?;
            debug!(nodes = count, "Loaded remote tree");
        }

        match command {
            Commands::Tree => self.handle_tree(),
            Commands::Cat { path } => self.handle_cat(path),
            Commands::Validate { dir } => self.handle_validate(dir.as_deref()),
            Commands::Pull { dir } => self.handle_pull(dir),
            Commands::Push {
                dir,
                prune,
                dry_run,
                yes,
            } => self.handle_push(dir, *prune, *dry_run, *yes),
            Commands::Schema { command } => self.handle_schema_command(command),
        }
    }

    fn handle_schema_command(&self, command: &SchemaCommands) -> Result<String, ApiError> {
        match command {
            SchemaCommands::Show => Ok(self.runtime.block_on(self.session.schema())?),
            SchemaCommands::Check { file } => {
                let yaml = std::fs::read_to_string(file)?;
                self.runtime.block_on(self.session.check_schema(&yaml))?;
                Ok("Schema is valid".to_string())
            }
            SchemaCommands::Apply { file, yes } => {
                let yaml = std::fs::read_to_string(file)?;
                let current = self.runtime.block_on(self.session.schema())?;
                if current == yaml {
                    return Ok("Schema unchanged".to_string());
                }
                if !*yes {
                    use dialoguer::Confirm;
                    let confirmed = Confirm::new()
                        .with_prompt(format!(
                            "Replace the schema on {} ({} lines)?",
                            self.config.cluster.endpoint,
                            yaml.lines().count()
                        ))
                        .default(false)
                        .interact()
                        .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
                    if !confirmed {
                        return Ok("Schema apply cancelled".to_string());
                    }
                }
                self.runtime.block_on(self.session.apply_schema(&yaml))?;
                info!(file = %file.display(), "Applied schema");
                Ok("Schema successfully applied".to_string())
            }
        }
    }

    fn handle_tree(&self) -> Result<String, ApiError> {
        let tree = self.session.tree();
        Ok(format!(
            "{}\n\n{}\nsynced: {}",
            format_section_heading(&self.config.cluster.endpoint),
            format_tree(&tree),
            short_hex(&self.session.fingerprint())
        ))
    }

    fn handle_cat(&self, path: &str) -> Result<String, ApiError> {
        let node = self
            .session
            .find_by_path(&normalize_path(path))
            .ok_or_else(|| ApiError::NotFound(path.to_string()))?;
        if node.is_folder() {
            return Err(OpError::NotAFile(node.path).into());
        }
        Ok(node.content)
    }

    fn handle_validate(&self, dir: Option<&Path>) -> Result<String, ApiError> {
        let mut out = String::new();
        if let Some(dir) = dir {
            let summary = self.stage_directory(dir, false)?;
            out.push_str(&format_stage_summary(&summary));
        }

        let errors = self.session.validate_all();
        if !errors.is_empty() {
            return Err(SyncError::Rejected(errors).into());
        }
        self.runtime.block_on(self.session.validate_remote())?;

        let files = self.session.nodes().iter().filter(|n| n.is_file() && !n.deleted).count();
        out.push_str(&format!("{} files valid", files));
        Ok(out)
    }

    fn handle_pull(&self, dir: &Path) -> Result<String, ApiError> {
        let nodes = self.session.nodes();
        let mut written = 0;
        for node in nodes.iter().filter(|n| !n.deleted) {
            let target = dir.join(&node.path);
            match node.kind {
                NodeKind::Folder => std::fs::create_dir_all(&target)?,
                NodeKind::File => {
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&target, &node.content)?;
                    written += 1;
                }
            }
        }
        info!(files = written, dir = %dir.display(), "Pulled configuration files");
        Ok(format!("Pulled {} files into {}", written, dir.display()))
    }

    fn handle_push(&self, dir: &Path, prune: bool, dry_run: bool, yes: bool) -> Result<String, ApiError> {
        let summary = self.stage_directory(dir, prune)?;
        let changes = self.session.pending_changes();
        if changes.is_empty() {
            return Ok("Nothing to push: remote files already match".to_string());
        }

        let errors = self.session.validate_all();
        if !errors.is_empty() {
            return Err(SyncError::Rejected(errors).into());
        }

        let table = format_change_table(&changes);
        if dry_run {
            return Ok(format!("{}{}", format_stage_summary(&summary), table));
        }

        if !yes {
            use dialoguer::Confirm;
            println!("{}", table);
            let confirmed = Confirm::new()
                .with_prompt(format!("Apply {} changes to {}?", changes.len(), self.config.cluster.endpoint))
                .default(false)
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Push cancelled".to_string());
            }
        }

        let sent = self.runtime.block_on(self.session.apply())?;
        Ok(format!(
            "Applied {} changes ({} removed)",
            sent.len(),
            sent.removals().count()
        ))
    }

    /// Stage the files under `dir` onto the loaded tree
    ///
    /// Missing folders and files are created through the session so every
    /// name passes the same checks as an interactive edit.
    pub fn stage_directory(&self, dir: &Path, prune: bool) -> Result<StageSummary, ApiError> {
        let local = read_local_files(dir)?;
        let ignored = &self.config.editor.ignored_paths;
        let mut summary = StageSummary::default();

        for (path, content) in local.iter().filter(|(p, _)| !ignored.contains(p)) {
            let segments = split_segments(path);
            let Some((name, folders)) = segments.split_last() else {
                continue;
            };

            let mut parent = String::new();
            for folder in folders {
                let folder_path = join_path(&parent, folder);
                match self.session.find_by_path(&folder_path) {
                    Some(node) if node.is_folder() => {}
                    Some(node) => return Err(OpError::NotAFolder(node.path).into()),
                    None => {
                        self.session.create_folder(&parent, folder)?;
                        summary.folders_created += 1;
                    }
                }
                parent = folder_path;
            }

            match self.session.find_by_path(path) {
                Some(node) if node.is_folder() => return Err(OpError::NotAFile(node.path).into()),
                Some(node) => {
                    if node.content != *content {
                        self.session.set_content(node.file_id, content)?;
                        summary.files_updated += 1;
                    }
                }
                None => {
                    let node = self.session.create_file(&parent, name)?;
                    self.session.set_content(node.file_id, content)?;
                    summary.files_created += 1;
                }
            }
        }

        if prune {
            let stale: Vec<_> = self
                .session
                .nodes()
                .iter()
                .filter(|n| n.is_file() && !n.deleted && !local.contains_key(&n.path))
                .map(|n| n.file_id)
                .collect();
            for file_id in stale {
                self.session.delete(file_id)?;
                summary.files_deleted += 1;
            }
        }

        debug!(?summary, "Staged local directory");
        Ok(summary)
    }
}

/// Relative `/`-separated path to content for every file under `dir`
fn read_local_files(dir: &Path) -> Result<BTreeMap<String, String>, ApiError> {
    if !dir.is_dir() {
        return Err(ApiError::NotFound(format!("directory {}", dir.display())));
    }
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ApiError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(path, std::fs::read_to_string(entry.path())?);
    }
    Ok(files)
}

fn format_stage_summary(summary: &StageSummary) -> String {
    format!(
        "Staged: {} folders created, {} files created, {} updated, {} deleted\n\n",
        summary.folders_created, summary.files_created, summary.files_updated, summary.files_deleted
    )
}

fn apply_overrides(config: &mut CfgTreeConfig, cli: &Cli) {
    if let Some(endpoint) = &cli.endpoint {
        config.cluster.endpoint = endpoint.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
}

/// Print validation errors from a rejected command, if that is what failed
pub fn describe_error(err: &ApiError) -> String {
    match err {
        ApiError::Sync(SyncError::Rejected(errors)) if !errors.is_empty() => {
            format!("Configuration rejected\n{}", format_validation_errors(errors))
        }
        other => other.to_string(),
    }
}
