//! Autoreview CLI - one-shot merge request review orchestrator
//!
//! Reads the run parameters from the environment (CI job variables), gathers
//! the merge request's metadata and diff, sends the composed document to the
//! generation agent and posts the result back as a comment.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autoreview_core::{pipeline, ClaudeAgent, Config, LocalRepo, MrProvider};
use autoreview_gitlab::{GitLabApi, GlabCli};

/// Which GitLab integration to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    /// GitLab REST API over HTTP
    Api,
    /// The glab command-line client
    Cli,
}

/// Autoreview: post an agent-generated review comment on a merge request
#[derive(Parser, Debug)]
#[command(name = "autoreview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// GitLab integration to use
    #[arg(long, value_enum, default_value_t = ProviderKind::Api)]
    provider: ProviderKind,

    /// Directory with review instruction documents (overrides env)
    #[arg(long, env = "REVIEW_PROMPTS_DIR")]
    prompts_dir: Option<PathBuf>,

    /// Maximum diff lines handed to the agent (overrides env)
    #[arg(long)]
    max_diff_lines: Option<usize>,

    /// Path to the agent executable (overrides env)
    #[arg(long, env = "REVIEW_AGENT_PATH")]
    agent_path: Option<String>,

    /// Model to use (overrides env)
    #[arg(long, env = "REVIEW_MODEL")]
    model: Option<String>,

    /// Local checkout used as the diff fallback (defaults to cwd)
    #[arg(long, default_value = ".")]
    workdir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // All environment reads happen here, before any external activity.
    let config = Config::from_env()?.with_cli_overrides(
        cli.prompts_dir,
        cli.max_diff_lines,
        cli.agent_path,
        cli.model,
    );

    if cli.verbose {
        tracing::info!(
            project = %config.project_path,
            mr_iid = config.mr_iid,
            max_diff_lines = config.max_diff_lines,
            prompts_dir = %config.prompts_dir.display(),
            "Configuration loaded"
        );
    }

    let provider: Box<dyn MrProvider> = match cli.provider {
        ProviderKind::Api => Box::new(GitLabApi::new(&config.server_url, &config.gitlab_token)?),
        ProviderKind::Cli => Box::new(GlabCli::new(&config.gitlab_token)),
    };

    let agent = ClaudeAgent::new(&config.agent_path, &config.agent_api_key)
        .with_model(config.model.clone());

    // The local checkout is optional: without one, the provider has to
    // serve the diff.
    let local = match LocalRepo::open(&cli.workdir) {
        Ok(repo) => Some(repo),
        Err(e) => {
            tracing::debug!(error = %e, "No local checkout available for diff fallback");
            None
        }
    };

    pipeline::run(&config, provider.as_ref(), &agent, local.as_ref()).await?;

    Ok(())
}
