//! Text rendering for the tree, pending changes, and validation errors.

use crate::error::ValidationError;
use crate::sync::ChangeSet;
use crate::tree::TreeNode;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Indented tree, folders in blue with a trailing slash, unsaved nodes starred.
pub fn format_tree(roots: &[TreeNode]) -> String {
    let mut out = String::new();
    for root in roots {
        root.walk(&mut |entry: &TreeNode, depth: usize| {
            let indent = "  ".repeat(depth);
            let marker = if entry.node.is_dirty() { " *" } else { "" };
            if entry.node.is_folder() {
                let name = format!("{}/", entry.node.file_name);
                out.push_str(&format!("{}{}{}\n", indent, name.blue().bold(), marker));
            } else {
                out.push_str(&format!("{}{}{}\n", indent, entry.node.file_name, marker));
            }
        });
    }
    if out.is_empty() {
        out.push_str("(no files)\n");
    }
    out
}

/// Table of the changes the next Apply would send.
pub fn format_change_table(changes: &ChangeSet) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Action", "Path", "Bytes"]);
    for change in &changes.changes {
        let (action, bytes) = match &change.content {
            Some(content) => ("upsert", content.len().to_string()),
            None => ("delete", "-".to_string()),
        };
        table.add_row(vec![action.to_string(), change.path.clone(), bytes]);
    }
    format!(
        "{}\n\n{}\n",
        format_section_heading(&format!("Pending changes ({})", changes.len())),
        table
    )
}

/// One located error per line.
pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}\n", "error:".red().bold(), e))
        .collect()
}
