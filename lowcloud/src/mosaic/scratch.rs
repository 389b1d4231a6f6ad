//! Scoped intermediate files.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Intermediate files removed when the guard goes out of scope.
///
/// Files registered with [`track`](Self::track) are deleted on drop unless
/// released with [`keep`](Self::keep). Missing files are ignored, so paths
/// can be tracked before the tool that writes them runs.
#[derive(Debug, Default)]
pub(crate) struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `path` for removal and returns it.
    pub(crate) fn track(&mut self, path: PathBuf) -> PathBuf {
        self.paths.push(path.clone());
        path
    }

    /// Releases `path`: it survives the guard.
    pub(crate) fn keep(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed intermediate file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!(path = %path.display(), error = %e, "failed to remove intermediate file"),
            }
        }
    }
}
