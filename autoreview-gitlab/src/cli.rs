//! `glab` CLI provider
//!
//! Shells out to the glab binary for each operation; useful where the runner
//! has glab configured but no direct API reachability. The token is handed
//! to the subprocess via its environment, never on the command line.

use std::process::Stdio;

use async_trait::async_trait;
use autoreview_core::{MrProvider, MrRef, RawMrMetadata};
use tokio::process::Command;
use tracing::debug;

use crate::types::{GitLabMr, MrDiffFile};
use crate::{Error, Result};

/// Provider backed by the `glab` command-line client
#[derive(Debug, Clone)]
pub struct GlabCli {
    glab_path: String,
    token: String,
}

impl GlabCli {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            glab_path: "glab".to_string(),
            token: token.into(),
        }
    }

    /// Set a custom path to the glab executable
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.glab_path = path.into();
        self
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(args = ?args, "Running glab");

        let output = Command::new(&self.glab_path)
            .args(args)
            .env("GITLAB_TOKEN", &self.token)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Cli(format!("glab executable not found at '{}'", self.glab_path))
                } else {
                    Error::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(Error::Cli(format!(
                "glab {} failed ({}): {}",
                args.first().unwrap_or(&""),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MrProvider for GlabCli {
    async fn fetch_metadata(&self, mr: &MrRef) -> autoreview_core::Result<RawMrMetadata> {
        let iid = mr.iid.to_string();
        let stdout = self
            .run(&["mr", "view", &iid, "--repo", &mr.project, "--output", "json"])
            .await
            .map_err(autoreview_core::Error::from)?;

        let payload: GitLabMr = serde_json::from_str(&stdout)
            .map_err(|e| autoreview_core::Error::Provider(e.to_string()))?;

        Ok(payload.into())
    }

    async fn list_changed_files(&self, mr: &MrRef) -> autoreview_core::Result<Vec<String>> {
        let endpoint = format!(
            "projects/{}/merge_requests/{}/diffs?per_page=100",
            urlencoding::encode(&mr.project),
            mr.iid
        );
        let stdout = self
            .run(&["api", &endpoint])
            .await
            .map_err(autoreview_core::Error::from)?;

        let files: Vec<MrDiffFile> = serde_json::from_str(&stdout)
            .map_err(|e| autoreview_core::Error::Provider(e.to_string()))?;

        Ok(files
            .iter()
            .filter_map(|f| f.path().map(str::to_string))
            .collect())
    }

    async fn fetch_diff(&self, mr: &MrRef) -> autoreview_core::Result<String> {
        let iid = mr.iid.to_string();
        let diff = self
            .run(&["mr", "diff", &iid, "--repo", &mr.project, "--raw"])
            .await
            .map_err(autoreview_core::Error::from)?;

        Ok(diff)
    }

    async fn post_comment(&self, mr: &MrRef, body: &str) -> autoreview_core::Result<()> {
        let iid = mr.iid.to_string();
        self.run(&["mr", "note", &iid, "--repo", &mr.project, "--message", body])
            .await
            .map_err(autoreview_core::Error::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_glab_binary_is_cli_error() {
        let cli = GlabCli::new("glpat-test").with_path("/nonexistent/glab-binary-12345");
        let err = cli.run(&["mr", "view", "1"]).await.unwrap_err();
        assert!(matches!(err, Error::Cli(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        // stand-in binary that always fails
        let cli = GlabCli::new("glpat-test").with_path("false");
        let err = cli.run(&["api", "whatever"]).await.unwrap_err();
        assert!(matches!(err, Error::Cli(_)));
    }

    #[test]
    fn test_provider_error_conversion() {
        let err: autoreview_core::Error = Error::Cli("boom".to_string()).into();
        assert!(matches!(err, autoreview_core::Error::Provider(_)));
    }
}
