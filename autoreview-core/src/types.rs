//! Pipeline data model
//!
//! Each entity here is produced by exactly one stage and consumed by the
//! next; nothing outlives a single run.

use serde::{Deserialize, Serialize};

/// Reference to the merge request under review
///
/// Constructed once from config at process start, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrRef {
    /// Namespaced project path (e.g. "group/project")
    pub project: String,
    /// Merge request iid within the project
    pub iid: u64,
}

impl MrRef {
    pub fn new(project: impl Into<String>, iid: u64) -> Self {
        Self {
            project: project.into(),
            iid,
        }
    }
}

impl std::fmt::Display for MrRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}", self.project, self.iid)
    }
}

/// Merge request details as returned by a provider query
///
/// Every field is optional; a failed query yields the `Default` value and
/// default substitution happens per field in [`MrMetadata::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMrMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
}

/// Fully-resolved merge request metadata
///
/// Never partially null: each field independently falls back to its
/// documented default when the source field is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrMetadata {
    pub title: String,
    pub description: String,
    pub source_branch: String,
    pub target_branch: String,
}

impl MrMetadata {
    pub const DEFAULT_TITLE: &'static str = "No title";
    pub const DEFAULT_DESCRIPTION: &'static str = "No description";
    pub const DEFAULT_SOURCE_BRANCH: &'static str = "unknown";
    pub const DEFAULT_TARGET_BRANCH: &'static str = "main";

    /// Substitute documented defaults for any missing field
    pub fn resolve(raw: RawMrMetadata) -> Self {
        let or_default = |field: Option<String>, default: &str| {
            field.filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
        };

        Self {
            title: or_default(raw.title, Self::DEFAULT_TITLE),
            description: or_default(raw.description, Self::DEFAULT_DESCRIPTION),
            source_branch: or_default(raw.source_branch, Self::DEFAULT_SOURCE_BRANCH),
            target_branch: or_default(raw.target_branch, Self::DEFAULT_TARGET_BRANCH),
        }
    }
}
