use crate::error::{ReleaseError, Result};
use git2::Repository;
use std::path::{Path, PathBuf};

/// Find the root of the git working tree containing `start`.
///
/// The release runs every tool from this directory, so the CLI can be started
/// from anywhere inside the repository.
pub fn discover_root(start: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(start)?;
    let workdir = repo.workdir().ok_or_else(|| {
        ReleaseError::config(format!(
            "repository at {} has no working tree",
            repo.path().display()
        ))
    })?;
    Ok(workdir.to_path_buf())
}
