//! Error types for GitLab operations

use thiserror::Error;

/// Result type for GitLab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to GitLab
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("GitLab HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("GitLab API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response decoding error
    #[error("GitLab response error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while driving the glab subprocess
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// glab subprocess failure
    #[error("glab error: {0}")]
    Cli(String),
}

impl From<Error> for autoreview_core::Error {
    fn from(err: Error) -> Self {
        autoreview_core::Error::Provider(err.to_string())
    }
}
