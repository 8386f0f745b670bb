//! Help page rendering from registered descriptors
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use serde::Serialize;
use std::sync::Arc;

use super::descriptor::CommandDescriptor;

/// One row of the help page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpEntry {
    pub usage: String,
    pub description: String,
    pub aliases: Vec<String>,
}

/// Rows for every descriptor marked to show in help, in the given order
pub fn help_entries(descriptors: &[Arc<CommandDescriptor>]) -> Vec<HelpEntry> {
    descriptors
        .iter()
        .filter(|descriptor| descriptor.show_in_help())
        .map(|descriptor| HelpEntry {
            usage: descriptor.usage().to_string(),
            description: descriptor.description().to_string(),
            aliases: descriptor.aliases().to_vec(),
        })
        .collect()
}

/// Help text with one `"{prefix}{usage} - {description}"` line per command
pub fn render_help(descriptors: &[Arc<CommandDescriptor>], prefix: &str) -> String {
    help_entries(descriptors)
        .iter()
        .map(|entry| format!("{prefix}{} - {}", entry.usage, entry.description))
        .collect::<Vec<_>>()
        .join("\n")
}
