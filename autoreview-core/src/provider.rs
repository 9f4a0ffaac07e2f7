//! Capability interface to the version-control service
//!
//! The pipeline only ever talks to the merge-request service through this
//! narrow trait; `autoreview-gitlab` provides the REST API and `glab` CLI
//! implementations.

use async_trait::async_trait;

use crate::types::{MrRef, RawMrMetadata};
use crate::Result;

/// Narrow interface to a merge-request service
#[async_trait]
pub trait MrProvider: Send + Sync {
    /// Fetch merge request metadata
    ///
    /// Failures are recoverable: the pipeline substitutes empty metadata.
    async fn fetch_metadata(&self, mr: &MrRef) -> Result<RawMrMetadata>;

    /// List the changed file paths
    async fn list_changed_files(&self, mr: &MrRef) -> Result<Vec<String>>;

    /// Fetch the unified diff text
    async fn fetch_diff(&self, mr: &MrRef) -> Result<String>;

    /// Post a comment on the merge request
    async fn post_comment(&self, mr: &MrRef, body: &str) -> Result<()>;
}
