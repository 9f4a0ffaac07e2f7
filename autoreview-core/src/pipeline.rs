//! The one-shot review pipeline
//!
//! Config -> (metadata, diff) -> prompts -> compose -> agent -> comment.
//! Metadata and the primary diff queries are prefetched concurrently; the
//! rest is strictly sequential. Metadata and file-list failures are absorbed
//! with defaults, everything downstream of composition is fatal.

use tracing::{error, info, warn};

use crate::agent::ReviewAgent;
use crate::compose::compose_document;
use crate::config::Config;
use crate::diff::ChangeSet;
use crate::git::LocalRepo;
use crate::prompts;
use crate::provider::MrProvider;
use crate::types::{MrMetadata, MrRef, RawMrMetadata};
use crate::{Error, Result};

/// Heading of the published comment
pub const COMMENT_HEADING: &str = "## Automated Code Review";
/// Attribution footer of the published comment
pub const COMMENT_FOOTER: &str = "_Generated by autoreview_";

/// Wrap raw agent output in the fixed comment template
pub fn format_comment(review: &str) -> String {
    format!(
        "{}\n\n{}\n\n---\n{}\n",
        COMMENT_HEADING,
        review.trim(),
        COMMENT_FOOTER
    )
}

/// Run the full review pipeline for the merge request named in `config`
///
/// `local` is the working-copy fallback for the diff stage; pass `None` when
/// no checkout is available (the provider then has to succeed).
pub async fn run(
    config: &Config,
    provider: &dyn MrProvider,
    agent: &dyn ReviewAgent,
    local: Option<&LocalRepo>,
) -> Result<()> {
    let mr = MrRef::new(config.project_path.clone(), config.mr_iid);
    info!(mr = %mr, "Starting review run");

    // Metadata and the primary diff queries are independent; prefetch them.
    let (raw_metadata, primary_files, primary_diff) = tokio::join!(
        provider.fetch_metadata(&mr),
        provider.list_changed_files(&mr),
        provider.fetch_diff(&mr),
    );

    let metadata = MrMetadata::resolve(match raw_metadata {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Metadata query failed, using defaults");
            RawMrMetadata::default()
        }
    });

    let files = match primary_files {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "Changed-file query failed, trying local fallback");
            match local.map(|repo| repo.changed_files(&metadata.target_branch)) {
                Some(Ok(files)) => files,
                Some(Err(e)) => {
                    warn!(error = %e, "Local changed-file fallback failed");
                    Vec::new()
                }
                None => Vec::new(),
            }
        }
    };

    let diff = match primary_diff {
        Ok(diff) => diff,
        Err(primary_err) => {
            warn!(error = %primary_err, "Diff query failed, trying local fallback");
            match local.map(|repo| repo.diff_against(&metadata.target_branch)) {
                Some(Ok(diff)) => diff,
                Some(Err(fallback_err)) => {
                    return Err(Error::DiffUnavailable(format!(
                        "provider: {}; local fallback: {}",
                        primary_err, fallback_err
                    )));
                }
                None => {
                    return Err(Error::DiffUnavailable(format!(
                        "provider: {}; no local checkout for fallback",
                        primary_err
                    )));
                }
            }
        }
    };

    let changes = ChangeSet::new(files, diff, config.max_diff_lines);
    info!(
        files = changes.files.len(),
        diff_lines = changes.diff.lines().count(),
        truncated = changes.truncated,
        "Collected change set"
    );

    let instructions = prompts::load_instructions(&config.prompts_dir)?;
    let document = compose_document(&mr, &metadata, &changes, &instructions);

    let review = agent.generate(&document).await?;

    let comment = format_comment(&review);
    if let Err(e) = provider.post_comment(&mr, &comment).await {
        // The review exists; make sure it is not silently lost.
        error!(review = %review, "Comment post failed, generated review preserved above");
        return Err(Error::Publication(format!(
            "{} (generated review preserved in process logs)",
            e
        )));
    }

    info!(mr = %mr, "Review comment posted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn test_config() -> Config {
        Config::from_lookup(|key| {
            match key {
                crate::config::ENV_MR_IID => Some("7".to_string()),
                crate::config::ENV_PROJECT_PATH => Some("group/project".to_string()),
                crate::config::ENV_GITLAB_TOKEN => Some("glpat-test".to_string()),
                crate::config::ENV_AGENT_KEY => Some("sk-test".to_string()),
                // point the prompt loader at nothing so defaults apply
                crate::config::ENV_PROMPTS_DIR => Some("/nonexistent/prompts".to_string()),
                _ => None,
            }
        })
        .unwrap()
    }

    #[derive(Default)]
    struct MockProvider {
        metadata_fails: bool,
        files_fail: bool,
        diff_fails: bool,
        post_fails: bool,
        fetch_calls: AtomicUsize,
        post_calls: AtomicUsize,
        posted_body: Mutex<Option<String>>,
    }

    #[async_trait]
    impl MrProvider for MockProvider {
        async fn fetch_metadata(&self, _mr: &MrRef) -> Result<RawMrMetadata> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.metadata_fails {
                return Err(Error::Provider("metadata endpoint down".to_string()));
            }
            Ok(RawMrMetadata {
                title: Some("Add login".to_string()),
                description: Some("Implements login".to_string()),
                source_branch: Some("feat/login".to_string()),
                target_branch: Some("main".to_string()),
            })
        }

        async fn list_changed_files(&self, _mr: &MrRef) -> Result<Vec<String>> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.files_fail {
                return Err(Error::Provider("diffs endpoint down".to_string()));
            }
            Ok(vec!["src/auth.rs".to_string()])
        }

        async fn fetch_diff(&self, _mr: &MrRef) -> Result<String> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.diff_fails {
                return Err(Error::Provider("raw_diffs endpoint down".to_string()));
            }
            Ok("+ fn login() {}".to_string())
        }

        async fn post_comment(&self, _mr: &MrRef, body: &str) -> Result<()> {
            self.post_calls.fetch_add(1, Ordering::SeqCst);
            if self.post_fails {
                return Err(Error::Provider("notes endpoint down".to_string()));
            }
            *self.posted_body.lock().unwrap() = Some(body.to_string());
            Ok(())
        }
    }

    struct MockAgent {
        fails: bool,
        output: &'static str,
        documents: Mutex<Vec<String>>,
    }

    impl MockAgent {
        fn ok(output: &'static str) -> Self {
            Self {
                fails: false,
                output,
                documents: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fails: true,
                output: "",
                documents: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReviewAgent for MockAgent {
        async fn generate(&self, document: &str) -> Result<String> {
            self.documents.lock().unwrap().push(document.to_string());
            if self.fails {
                return Err(Error::Generation("agent exited with exit status: 1".to_string()));
            }
            Ok(self.output.to_string())
        }
    }

    #[test]
    fn test_format_comment_order() {
        let body = format_comment("LGTM");
        let heading = body.find(COMMENT_HEADING).unwrap();
        let review = body.find("LGTM").unwrap();
        let footer = body.find(COMMENT_FOOTER).unwrap();
        assert!(heading < review);
        assert!(review < footer);
    }

    #[tokio::test]
    async fn test_happy_path_posts_templated_comment() {
        let provider = MockProvider::default();
        let agent = MockAgent::ok("LGTM");

        run(&test_config(), &provider, &agent, None).await.unwrap();

        assert_eq!(provider.post_calls.load(Ordering::SeqCst), 1);
        let body = provider.posted_body.lock().unwrap().clone().unwrap();
        let heading = body.find(COMMENT_HEADING).unwrap();
        let review = body.find("LGTM").unwrap();
        let footer = body.find(COMMENT_FOOTER).unwrap();
        assert!(heading < review && review < footer);
    }

    #[tokio::test]
    async fn test_document_contains_all_sections() {
        let provider = MockProvider::default();
        let agent = MockAgent::ok("LGTM");

        run(&test_config(), &provider, &agent, None).await.unwrap();

        let documents = agent.documents.lock().unwrap();
        let doc = &documents[0];
        assert!(doc.contains("Add login"));
        assert!(doc.contains("src/auth.rs"));
        assert!(doc.contains(crate::prompts::DEFAULT_INSTRUCTIONS));
        assert!(doc.contains("+ fn login() {}"));
    }

    #[tokio::test]
    async fn test_metadata_failure_is_absorbed_with_defaults() {
        let provider = MockProvider {
            metadata_fails: true,
            ..Default::default()
        };
        let agent = MockAgent::ok("LGTM");

        run(&test_config(), &provider, &agent, None).await.unwrap();

        let documents = agent.documents.lock().unwrap();
        let doc = &documents[0];
        assert!(doc.contains("No title"));
        assert!(doc.contains("No description"));
        assert!(doc.contains("unknown -> main"));
    }

    #[tokio::test]
    async fn test_file_list_failure_is_absorbed() {
        let provider = MockProvider {
            files_fail: true,
            ..Default::default()
        };
        let agent = MockAgent::ok("LGTM");

        run(&test_config(), &provider, &agent, None).await.unwrap();
        assert_eq!(provider.post_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_diff_failure_without_fallback_is_fatal() {
        let provider = MockProvider {
            diff_fails: true,
            ..Default::default()
        };
        let agent = MockAgent::ok("LGTM");

        let err = run(&test_config(), &provider, &agent, None).await.unwrap_err();
        assert!(matches!(err, Error::DiffUnavailable(_)));
        assert_eq!(provider.post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_agent_failure_means_nothing_posted() {
        let provider = MockProvider::default();
        let agent = MockAgent::failing();

        let err = run(&test_config(), &provider, &agent, None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(provider.post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_publication_failure_is_distinct() {
        let provider = MockProvider {
            post_fails: true,
            ..Default::default()
        };
        let agent = MockAgent::ok("LGTM");

        let err = run(&test_config(), &provider, &agent, None).await.unwrap_err();
        assert!(matches!(err, Error::Publication(_)));
        // the diagnostic points the operator at the preserved review
        assert!(err.to_string().contains("preserved"));
    }

    #[tokio::test]
    async fn test_missing_mandatory_parameter_precedes_all_external_calls() {
        let provider = MockProvider::default();
        let agent = MockAgent::ok("LGTM");

        // Mirror the binary's setup order: configuration resolves before the
        // pipeline ever runs, so a missing mandatory variable stops the run
        // with zero provider or agent activity.
        let config = Config::from_lookup(|_| None);
        assert!(matches!(config, Err(Error::Config(_))));
        if let Ok(config) = config {
            run(&config, &provider, &agent, None).await.unwrap();
        }

        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.post_calls.load(Ordering::SeqCst), 0);
        assert!(agent.documents.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_files_reach_the_document() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("style.md"), "Check naming conventions").unwrap();

        let mut config = test_config();
        config.prompts_dir = PathBuf::from(dir.path());

        let provider = MockProvider::default();
        let agent = MockAgent::ok("LGTM");

        run(&config, &provider, &agent, None).await.unwrap();

        let documents = agent.documents.lock().unwrap();
        assert!(documents[0].contains("Check naming conventions"));
        assert!(!documents[0].contains(crate::prompts::DEFAULT_INSTRUCTIONS));
    }
}
