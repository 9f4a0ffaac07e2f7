//! Review instruction loading
//!
//! Instruction documents are plain `.md`/`.txt` files in a configurable
//! directory. A missing directory is not an error, it simply yields zero
//! documents; an empty result is replaced wholesale by the built-in default
//! instruction block.

use std::path::Path;

use tracing::{debug, info};

use crate::Result;

/// Built-in instructions used when no prompt documents are found
pub const DEFAULT_INSTRUCTIONS: &str = "\
Review this merge request for:

- Code quality and readability
- Potential bugs and security issues
- Performance concerns
- Test coverage
- Documentation completeness

Be concise and actionable. Reference files and line numbers where possible.";

const PROMPT_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Load review instructions from `dir`
///
/// Reads every `.md`/`.txt` file directly inside the directory (no
/// recursion), sorted lexicographically by file name, and joins the contents
/// with blank lines. Falls back to [`DEFAULT_INSTRUCTIONS`] when nothing is
/// found.
pub fn load_instructions(dir: &Path) -> Result<String> {
    let mut documents = Vec::new();

    if dir.is_dir() {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| PROMPT_EXTENSIONS.contains(&ext))
            })
            .collect();

        // Directory-listing order is filesystem-dependent; sort for
        // deterministic composition.
        paths.sort();

        for path in paths {
            debug!(path = %path.display(), "Loading instruction document");
            documents.push(std::fs::read_to_string(&path)?);
        }
    } else {
        debug!(dir = %dir.display(), "Prompts directory not found, using defaults");
    }

    // Contents are kept verbatim; the default block substitutes only when
    // the whole concatenation is empty, never merging with partial content.
    let joined = documents.join("\n\n");
    if joined.is_empty() {
        info!("No instruction documents found, using built-in defaults");
        return Ok(DEFAULT_INSTRUCTIONS.to_string());
    }

    info!(count = documents.len(), "Loaded instruction documents");
    Ok(joined)
}
