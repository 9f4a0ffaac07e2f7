//! Local working-copy diff fallback
//!
//! When the provider cannot serve the file list or diff, the pipeline falls
//! back to a two-ref comparison of `origin/<target_branch>` against HEAD in
//! the local checkout.

use std::path::{Path, PathBuf};

use git2::{Diff, DiffFormat, Repository};
use tracing::debug;

use crate::{Error, Result};

/// A local git repository usable as a diff source
pub struct LocalRepo {
    repo: Repository,
    root: PathBuf,
}

impl std::fmt::Debug for LocalRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl LocalRepo {
    /// Open a git repository, searching upward from the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Git(format!("not a git repository: {}", path.display()))
            } else {
                Error::Git(e.to_string())
            }
        })?;

        let root = repo
            .workdir()
            .ok_or_else(|| Error::Git("bare repositories are not supported".to_string()))?
            .to_path_buf();

        Ok(Self { repo, root })
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Unified diff of `origin/<target_branch>` vs HEAD
    pub fn diff_against(&self, target_branch: &str) -> Result<String> {
        let diff = self.two_ref_diff(target_branch)?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => text.push(line.origin()),
                _ => {}
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(text)
    }

    /// Changed file paths between `origin/<target_branch>` and HEAD
    pub fn changed_files(&self, target_branch: &str) -> Result<Vec<String>> {
        let diff = self.two_ref_diff(target_branch)?;

        let files = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        Ok(files)
    }

    fn two_ref_diff(&self, target_branch: &str) -> Result<Diff<'_>> {
        let base_ref = format!("refs/remotes/origin/{}", target_branch);
        debug!(base = %base_ref, "Computing local two-ref diff");

        let base_tree = self
            .repo
            .find_reference(&base_ref)
            .map_err(|e| Error::Git(format!("cannot resolve {}: {}", base_ref, e)))?
            .peel_to_tree()?;

        let head_tree = self.repo.head()?.peel_to_tree()?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)?;

        Ok(diff)
    }
}
