//! GitLab integration for the autoreview pipeline
//!
//! Two implementations of the core `MrProvider` capability trait: a REST API
//! client and a `glab` CLI wrapper.

pub mod api;
pub mod cli;
pub mod error;
pub mod types;

pub use api::GitLabApi;
pub use cli::GlabCli;
pub use error::{Error, Result};
