//! Error types for the review pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pipeline operations
///
/// Config, DiffUnavailable, Generation and Publication always abort the run.
/// Provider errors are absorbed by the pipeline wherever a fallback or
/// default substitution exists.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or invalid configuration parameter
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider call failed (may be recoverable via fallback)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Both the provider and the local fallback failed to produce a diff
    #[error("Diff unavailable: {0}")]
    DiffUnavailable(String),

    /// The generation agent failed or exited nonzero
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The comment post failed after a review was generated
    ///
    /// The generated review is logged at error level before this is
    /// returned, so the result survives in process logs.
    #[error("Publication failed: {0}")]
    Publication(String),

    /// Local git error
    #[error("Git error: {0}")]
    Git(String),
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Git(err.to_string())
    }
}
