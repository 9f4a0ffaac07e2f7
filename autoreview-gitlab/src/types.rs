//! GitLab response payloads shared by the API and CLI providers

use autoreview_core::RawMrMetadata;
use serde::Deserialize;

/// Merge request payload from `GET /projects/:id/merge_requests/:iid`
/// (and `glab mr view --output json`, which mirrors it)
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabMr {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_branch: Option<String>,
    #[serde(default)]
    pub target_branch: Option<String>,
}

impl From<GitLabMr> for RawMrMetadata {
    fn from(mr: GitLabMr) -> Self {
        RawMrMetadata {
            title: mr.title,
            description: mr.description,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
        }
    }
}

/// One entry from `GET /projects/:id/merge_requests/:iid/diffs`
#[derive(Debug, Clone, Deserialize)]
pub struct MrDiffFile {
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub old_path: Option<String>,
}

impl MrDiffFile {
    /// The path to report for this change (new path, old on deletion)
    pub fn path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }
}
