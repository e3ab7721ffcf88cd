//! Content validation
//!
//! Synchronous, pure syntax checks of a file's current content. Errors carry
//! a 1-based line and column so the editor can place inline markers.

use crate::error::ValidationError;
use crate::tree::node::FileNode;
use std::collections::HashMap;
use std::sync::Arc;

/// Syntax check for one kind of file
pub trait ContentValidator: Send + Sync {
    /// `None` when the content is well-formed
    fn validate(&self, node: &FileNode) -> Option<ValidationError>;
}

/// YAML well-formedness check
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlValidator;

impl ContentValidator for YamlValidator {
    fn validate(&self, node: &FileNode) -> Option<ValidationError> {
        let err = serde_yaml::from_str::<serde_yaml::Value>(&node.content).err()?;
        let mut error = ValidationError::new(yaml_message(&err)).with_path(node.path.clone());
        if let Some(location) = err.location() {
            error = error.at(location.line() as u32, location.column() as u32);
        }
        Some(error)
    }
}

/// Strip the " at line X column Y" suffix serde_yaml appends; location is reported separately
fn yaml_message(err: &serde_yaml::Error) -> String {
    let text = err.to_string();
    match text.find(" at line ") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

/// Validators keyed by file extension
#[derive(Clone)]
pub struct ValidatorSet {
    by_extension: HashMap<String, Arc<dyn ContentValidator>>,
}

impl Default for ValidatorSet {
    fn default() -> Self {
        let yaml: Arc<dyn ContentValidator> = Arc::new(YamlValidator);
        let mut set = Self::empty();
        set.register("yml", Arc::clone(&yaml));
        set.register("yaml", yaml);
        set
    }
}

impl ValidatorSet {
    /// A set with no validators; every file passes
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    pub fn register(&mut self, extension: &str, validator: Arc<dyn ContentValidator>) {
        self.by_extension.insert(extension.to_string(), validator);
    }

    /// Validate a file; folders and files without a registered validator pass
    pub fn validate(&self, node: &FileNode) -> Option<ValidationError> {
        if node.is_folder() {
            return None;
        }
        let ext = node.file_name.rsplit_once('.').map(|(_, ext)| ext)?;
        self.by_extension.get(ext)?.validate(node)
    }

    /// Validate every live file, in path order
    pub fn validate_all<'a>(
        &self,
        nodes: impl IntoIterator<Item = &'a FileNode>,
    ) -> Vec<ValidationError> {
        let mut files: Vec<&FileNode> = nodes
            .into_iter()
            .filter(|n| !n.deleted && n.is_file())
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.into_iter().filter_map(|n| self.validate(n)).collect()
    }
}
