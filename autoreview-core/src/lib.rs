//! Autoreview Core - review pipeline for merge requests
//!
//! This crate provides the one-shot pipeline that gathers a merge request's
//! metadata and diff, merges them with review instructions, hands the result
//! to a text-generation agent and publishes the output as a comment.

pub mod agent;
pub mod compose;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod types;

pub use agent::{ClaudeAgent, ReviewAgent};
pub use config::Config;
pub use diff::ChangeSet;
pub use error::{Error, Result};
pub use git::LocalRepo;
pub use provider::MrProvider;
pub use types::{MrMetadata, MrRef, RawMrMetadata};
