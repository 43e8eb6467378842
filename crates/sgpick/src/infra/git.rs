//! Project root discovery.

use std::path::{Path, PathBuf};

/// Working tree root of the repository containing `start`, or `start` itself outside a repository.
pub fn project_root(start: &Path) -> PathBuf {
    match gix::discover(start) {
        Ok(repo) => repo
            .work_dir()
            .map(Path::to_path_buf)
            .or_else(|| repo.path().parent().map(Path::to_path_buf))
            .unwrap_or_else(|| start.to_path_buf()),
        Err(err) => {
            tracing::debug!(path = %start.display(), error = %err, "no repository found");
            start.to_path_buf()
        }
    }
}
