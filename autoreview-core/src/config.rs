//! Configuration for a review run
//!
//! All parameters are resolved from the process environment exactly once at
//! startup; no pipeline stage reads the environment directly. CLI flags may
//! override the optional parameters afterwards.

use std::path::PathBuf;

use crate::{Error, Result};

/// Mandatory: merge request iid
pub const ENV_MR_IID: &str = "CI_MERGE_REQUEST_IID";
/// Mandatory: namespaced project path (e.g. "group/project")
pub const ENV_PROJECT_PATH: &str = "CI_PROJECT_PATH";
/// Mandatory: GitLab API token
pub const ENV_GITLAB_TOKEN: &str = "GITLAB_TOKEN";
/// Mandatory: credential exported to the generation agent
pub const ENV_AGENT_KEY: &str = "ANTHROPIC_API_KEY";

/// Optional: directory holding review instruction documents
pub const ENV_PROMPTS_DIR: &str = "REVIEW_PROMPTS_DIR";
/// Optional: maximum number of diff lines handed to the agent
pub const ENV_MAX_DIFF_LINES: &str = "REVIEW_MAX_DIFF_LINES";
/// Optional: GitLab server base URL
pub const ENV_SERVER_URL: &str = "CI_SERVER_URL";
/// Optional: path to the agent executable
pub const ENV_AGENT_PATH: &str = "REVIEW_AGENT_PATH";
/// Optional: model passed through to the agent
pub const ENV_MODEL: &str = "REVIEW_MODEL";

const DEFAULT_PROMPTS_DIR: &str = ".gitlab/review-prompts";
const DEFAULT_MAX_DIFF_LINES: usize = 5000;
const DEFAULT_SERVER_URL: &str = "https://gitlab.com";
const DEFAULT_AGENT_PATH: &str = "claude";

/// Resolved configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct Config {
    /// Merge request iid within the project
    pub mr_iid: u64,
    /// Namespaced project path
    pub project_path: String,
    /// GitLab API token
    pub gitlab_token: String,
    /// Generation-agent credential, exported into the agent child process
    pub agent_api_key: String,
    /// Directory containing instruction documents
    pub prompts_dir: PathBuf,
    /// Diff line budget; anything beyond is truncated
    pub max_diff_lines: usize,
    /// GitLab server base URL (no trailing slash)
    pub server_url: String,
    /// Path to the agent executable
    pub agent_path: String,
    /// Model to use (agent default when unset)
    pub model: Option<String>,
}

impl Config {
    /// Resolve configuration from the process environment
    ///
    /// Fails fast with a `Config` error naming the first missing mandatory
    /// variable. No network or process activity happens here.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup
    ///
    /// Kept separate from [`Config::from_env`] so tests never have to mutate
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(Error::Config(format!(
                    "missing required environment variable {}",
                    key
                ))),
            }
        };

        let mr_iid = required(ENV_MR_IID)?.parse::<u64>().map_err(|e| {
            Error::Config(format!("{} is not a valid merge request iid: {}", ENV_MR_IID, e))
        })?;
        let project_path = required(ENV_PROJECT_PATH)?;
        let gitlab_token = required(ENV_GITLAB_TOKEN)?;
        let agent_api_key = required(ENV_AGENT_KEY)?;

        let prompts_dir = lookup(ENV_PROMPTS_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR));

        let max_diff_lines = match lookup(ENV_MAX_DIFF_LINES) {
            Some(v) => v.parse::<usize>().map_err(|e| {
                Error::Config(format!("{} is not a valid line count: {}", ENV_MAX_DIFF_LINES, e))
            })?,
            None => DEFAULT_MAX_DIFF_LINES,
        };

        let server_url = lookup(ENV_SERVER_URL)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let agent_path = lookup(ENV_AGENT_PATH).unwrap_or_else(|| DEFAULT_AGENT_PATH.to_string());
        let model = lookup(ENV_MODEL);

        Ok(Self {
            mr_iid,
            project_path,
            gitlab_token,
            agent_api_key,
            prompts_dir,
            max_diff_lines,
            server_url,
            agent_path,
            model,
        })
    }

    /// Apply CLI flag overrides to the optional parameters
    pub fn with_cli_overrides(
        mut self,
        prompts_dir: Option<PathBuf>,
        max_diff_lines: Option<usize>,
        agent_path: Option<String>,
        model: Option<String>,
    ) -> Self {
        if let Some(dir) = prompts_dir {
            self.prompts_dir = dir;
        }

        if let Some(limit) = max_diff_lines {
            self.max_diff_lines = limit;
        }

        if let Some(path) = agent_path {
            self.agent_path = path;
        }

        if let Some(m) = model {
            self.model = Some(m);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_MR_IID, "42"),
            (ENV_PROJECT_PATH, "group/project"),
            (ENV_GITLAB_TOKEN, "glpat-test"),
            (ENV_AGENT_KEY, "sk-test"),
        ])
    }

    fn resolve(env: &HashMap<&str, &str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_resolves_with_defaults() {
        let config = resolve(&full_env()).unwrap();
        assert_eq!(config.mr_iid, 42);
        assert_eq!(config.project_path, "group/project");
        assert_eq!(config.prompts_dir, PathBuf::from(".gitlab/review-prompts"));
        assert_eq!(config.max_diff_lines, 5000);
        assert_eq!(config.server_url, "https://gitlab.com");
        assert_eq!(config.agent_path, "claude");
        assert!(config.model.is_none());
    }

    #[test]
    fn test_each_missing_mandatory_is_named() {
        for missing in [ENV_MR_IID, ENV_PROJECT_PATH, ENV_GITLAB_TOKEN, ENV_AGENT_KEY] {
            let mut env = full_env();
            env.remove(missing);
            let err = resolve(&env).unwrap_err();
            match err {
                Error::Config(msg) => assert!(msg.contains(missing), "{} not named in: {}", missing, msg),
                other => panic!("expected Config error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_mandatory_is_missing() {
        let mut env = full_env();
        env.insert(ENV_GITLAB_TOKEN, "");
        assert!(resolve(&env).is_err());
    }

    #[test]
    fn test_invalid_iid_is_config_error() {
        let mut env = full_env();
        env.insert(ENV_MR_IID, "not-a-number");
        let err = resolve(&env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_optional_overrides_from_env() {
        let mut env = full_env();
        env.insert(ENV_MAX_DIFF_LINES, "100");
        env.insert(ENV_PROMPTS_DIR, "docs/prompts");
        env.insert(ENV_SERVER_URL, "https://gitlab.example.com/");
        let config = resolve(&env).unwrap();
        assert_eq!(config.max_diff_lines, 100);
        assert_eq!(config.prompts_dir, PathBuf::from("docs/prompts"));
        // trailing slash is stripped
        assert_eq!(config.server_url, "https://gitlab.example.com");
    }

    #[test]
    fn test_invalid_max_diff_lines_is_config_error() {
        let mut env = full_env();
        env.insert(ENV_MAX_DIFF_LINES, "lots");
        assert!(matches!(resolve(&env), Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let config = resolve(&full_env()).unwrap().with_cli_overrides(
            Some(PathBuf::from("/custom/prompts")),
            Some(250),
            Some("/custom/claude".to_string()),
            Some("opus".to_string()),
        );

        assert_eq!(config.prompts_dir, PathBuf::from("/custom/prompts"));
        assert_eq!(config.max_diff_lines, 250);
        assert_eq!(config.agent_path, "/custom/claude");
        assert_eq!(config.model, Some("opus".to_string()));
    }
}
