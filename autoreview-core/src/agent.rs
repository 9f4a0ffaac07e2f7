//! Generation-agent invocation
//!
//! The composed document is handed to an external agent process over stdin
//! and the run blocks until the agent exits. There is no fallback reviewer:
//! a nonzero exit is fatal and nothing gets published.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{Error, Result};

/// Seam for the text-generation agent
#[async_trait]
pub trait ReviewAgent: Send + Sync {
    /// Generate review text for the composed document
    async fn generate(&self, document: &str) -> Result<String>;
}

/// Claude Code CLI agent
///
/// Invokes `claude --print` with the document on stdin and captures the
/// combined output. The credential is passed into the child environment
/// explicitly; the pipeline never writes it anywhere else.
#[derive(Debug, Clone)]
pub struct ClaudeAgent {
    agent_path: String,
    api_key: String,
    model: Option<String>,
}

impl ClaudeAgent {
    pub fn new(agent_path: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            agent_path: agent_path.into(),
            api_key: api_key.into(),
            model: None,
        }
    }

    /// Use a specific model instead of the agent default
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.agent_path);
        cmd.arg("--print");

        if let Some(ref model) = self.model {
            cmd.arg("--model").arg(model);
        }

        cmd.env("ANTHROPIC_API_KEY", &self.api_key)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd
    }
}

#[async_trait]
impl ReviewAgent for ClaudeAgent {
    async fn generate(&self, document: &str) -> Result<String> {
        debug!(bytes = document.len(), agent = %self.agent_path, "Invoking generation agent");

        let mut child = self.build_command().spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Generation(format!(
                    "agent executable not found at '{}'",
                    self.agent_path
                ))
            } else {
                Error::Io(e)
            }
        })?;

        // stdin is piped above, so take() cannot fail
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Generation("agent stdin unavailable".to_string()))?;

        // The write must run concurrently with output collection: an agent
        // that fills its stdout pipe before consuming stdin would otherwise
        // block against our blocked write.
        let payload = document.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            // An agent that exits early closes the pipe; its exit status is
            // the signal that matters, not the broken write.
            match stdin.write_all(&payload).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        });

        let output = child.wait_with_output().await?;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::Io(e)),
            Err(e) => {
                return Err(Error::Generation(format!("stdin writer task failed: {}", e)))
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(Error::Generation(format!(
                "agent exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        info!(bytes = stdout.len(), "Generation agent completed");

        // Combined output: anything on stderr is kept alongside the review.
        let mut result = stdout.into_owned();
        if !stderr.trim().is_empty() {
            result.push('\n');
            result.push_str(stderr.trim());
        }

        Ok(result)
    }
}
