//! Review document composition
//!
//! Pure assembly of metadata, file list, instructions and diff into the one
//! text document handed to the generation agent. Inputs are assumed to be
//! bounded already; no truncation happens here.

use crate::diff::ChangeSet;
use crate::types::{MrMetadata, MrRef};

/// Compose the review document for one merge request
///
/// Section order is fixed: title block, description, changed files,
/// instructions, diff.
pub fn compose_document(
    mr: &MrRef,
    metadata: &MrMetadata,
    changes: &ChangeSet,
    instructions: &str,
) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# Merge Request Review: {}\n\n", metadata.title));
    doc.push_str(&format!(
        "MR: {} ({} -> {})\n\n",
        mr, metadata.source_branch, metadata.target_branch
    ));

    doc.push_str("## Description\n\n");
    doc.push_str(&metadata.description);
    doc.push_str("\n\n");

    doc.push_str("## Changed Files\n\n");
    if changes.files.is_empty() {
        doc.push_str("(no changed files reported)\n");
    } else {
        for file in &changes.files {
            doc.push_str(file);
            doc.push('\n');
        }
    }
    doc.push('\n');

    doc.push_str("## Review Instructions\n\n");
    doc.push_str(instructions);
    doc.push_str("\n\n");

    doc.push_str("## Diff\n\n");
    doc.push_str("```diff\n");
    doc.push_str(&changes.diff);
    doc.push_str("\n```\n");

    doc
}
