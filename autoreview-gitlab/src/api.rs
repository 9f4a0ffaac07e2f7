//! REST API provider (GitLab v4)
//!
//! Endpoints used:
//! - GET  /projects/:id/merge_requests/:iid
//! - GET  /projects/:id/merge_requests/:iid/diffs     (changed-file list)
//! - GET  /projects/:id/merge_requests/:iid/raw_diffs (unified diff text)
//! - POST /projects/:id/merge_requests/:iid/notes     (review comment)

use std::time::Duration;

use async_trait::async_trait;
use autoreview_core::{MrProvider, MrRef, RawMrMetadata};
use reqwest::{Client, Response};
use tracing::debug;

use crate::types::{GitLabMr, MrDiffFile};
use crate::{Error, Result};

/// Request timeout for all GitLab calls; these are the pipeline's only
/// unbounded-latency network operations.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// GitLab REST API client
pub struct GitLabApi {
    http: Client,
    base_api: String,
    token: String,
}

impl GitLabApi {
    /// Create a client against `server_url` (e.g. "https://gitlab.com")
    pub fn new(server_url: &str, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_api: format!("{}/api/v4", server_url.trim_end_matches('/')),
            token: token.into(),
        })
    }

    fn mr_url(&self, mr: &MrRef, suffix: &str) -> String {
        format!(
            "{}/projects/{}/merge_requests/{}{}",
            self.base_api,
            urlencoding::encode(&mr.project),
            mr.iid,
            suffix
        )
    }

    async fn get(&self, url: String) -> Result<Response> {
        debug!(url = %url, "GitLab GET");
        let resp = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;
        check_status(resp).await
    }
}

impl std::fmt::Debug for GitLabApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabApi")
            .field("base_api", &self.base_api)
            .finish_non_exhaustive()
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(Error::Status {
        status: status.as_u16(),
        body: resp.text().await.unwrap_or_default(),
    })
}

#[async_trait]
impl MrProvider for GitLabApi {
    async fn fetch_metadata(&self, mr: &MrRef) -> autoreview_core::Result<RawMrMetadata> {
        let payload: GitLabMr = self
            .get(self.mr_url(mr, ""))
            .await
            .map_err(autoreview_core::Error::from)?
            .json()
            .await
            .map_err(|e| autoreview_core::Error::Provider(e.to_string()))?;

        Ok(payload.into())
    }

    async fn list_changed_files(&self, mr: &MrRef) -> autoreview_core::Result<Vec<String>> {
        let files: Vec<MrDiffFile> = self
            .get(self.mr_url(mr, "/diffs?per_page=100"))
            .await
            .map_err(autoreview_core::Error::from)?
            .json()
            .await
            .map_err(|e| autoreview_core::Error::Provider(e.to_string()))?;

        Ok(files
            .iter()
            .filter_map(|f| f.path().map(str::to_string))
            .collect())
    }

    async fn fetch_diff(&self, mr: &MrRef) -> autoreview_core::Result<String> {
        let diff = self
            .get(self.mr_url(mr, "/raw_diffs"))
            .await
            .map_err(autoreview_core::Error::from)?
            .text()
            .await
            .map_err(|e| autoreview_core::Error::Provider(e.to_string()))?;

        Ok(diff)
    }

    async fn post_comment(&self, mr: &MrRef, body: &str) -> autoreview_core::Result<()> {
        #[derive(serde::Serialize)]
        struct NoteReq<'a> {
            body: &'a str,
        }

        let url = self.mr_url(mr, "/notes");
        debug!(url = %url, "GitLab POST note");

        let resp = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&NoteReq { body })
            .send()
            .await
            .map_err(|e| autoreview_core::Error::Provider(e.to_string()))?;

        check_status(resp)
            .await
            .map_err(autoreview_core::Error::from)?;

        Ok(())
    }
}
