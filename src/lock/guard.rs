//! RAII guard for a held directory lock.

use super::holder::HOLDER_FILE;
use crate::error::{MkonceError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A held lock. Dropping the guard releases the lock.
///
/// Release removes the holder record and then the lock directory. The lock
/// may have been declared stale and stolen by another contender while this
/// process was hung; in that case release finds nothing to remove and is a
/// no-op (best-effort cleanup, never fatal).
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    /// Path of the lock directory this guard holds.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly, surfacing removal errors.
    ///
    /// A lock that no longer exists (stolen after staleness) is not an
    /// error; any other filesystem failure is.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_lock_dir(&self.path)?;
        debug!(path = %self.path.display(), "released lock");
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match remove_lock_dir(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "released lock"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to release lock"),
        }
    }
}

/// Remove the holder record then the lock directory, tolerating both
/// already being gone.
fn remove_lock_dir(path: &Path) -> Result<()> {
    match fs::remove_file(path.join(HOLDER_FILE)) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(MkonceError::io(path.join(HOLDER_FILE), e)),
    }

    match fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MkonceError::io(path, e)),
    }
}
