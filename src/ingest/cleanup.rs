//! Speculative file writes with guaranteed rollback.
//!
//! The filesystem and the store cannot share a transaction, so an upload
//! writes its file first and commits the row second. [`PendingFile`] owns
//! the written file until the row exists: dropping the guard on any early
//! return deletes the file, and only [`PendingFile::keep`] lets it stay.
//!
//! Removal is best effort. A failure is logged at `warn` and swallowed so
//! that the error which caused the rollback is the one the caller sees.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;

/// A file on disk that will be removed unless explicitly kept.
#[derive(Debug)]
#[must_use = "dropping a PendingFile removes the file it guards"]
pub struct PendingFile {
    path: PathBuf,
    armed: bool,
}

impl PendingFile {
    /// Durably write `bytes` to `path` and guard the result.
    ///
    /// The data is staged in a hidden temp file next to `path`, synced, then
    /// persisted into place, so a reader never sees a truncated file at the
    /// final path. An existing file at `path` is an error rather than being
    /// overwritten. The staged file is deleted on every failure.
    pub fn write(path: &Path, bytes: &[u8]) -> io::Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = Builder::new()
            .prefix(".")
            .suffix(".partial")
            .tempfile_in(dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist_noclobber(path).map_err(|e| e.error)?;

        sync_parent(path);
        Ok(PendingFile::guard(path.to_path_buf()))
    }

    /// Take responsibility for an already existing file.
    pub fn guard(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard and leave the file in place.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.armed {
            remove_best_effort(&self.path);
        }
    }
}

/// Delete `path`, logging instead of failing. A file that is already gone
/// counts as removed.
pub fn remove_best_effort(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed file");
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
            false
        }
    }
}

/// Persist the rename itself. Failure here only gets logged.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            tracing::debug!(dir = %parent.display(), error = %e, "directory sync skipped");
        }
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
