//! Run-exactly-once coordination across processes and nodes.
//!
//! [`OnceGuard`] wraps a unit of work so it executes at most once for a
//! given `(base_directory, name)` key, no matter how many callers race on
//! it: threads, processes, or hosts sharing only a network filesystem.
//! Mutual exclusion comes from a [`DirectoryLock`]; the terminal outcome is
//! recorded in marker files that short-circuit every later caller:
//!
//! ```text
//! <base>/<name>.lock/     lock directory while a caller is deciding/working
//! <base>/<name>.done      created on first successful completion
//! <base>/<name>.failed    created on first failed completion; holds the error text
//! ```
//!
//! At most one of the two markers exists at a time. The transition from
//! pending to done/failed is write-once and only [`OnceGuard::reset`]
//! clears it.


use crate::error::{MkonceError, Result};
use crate::fs::{nfs_file_exists, remove_if_exists, write_durable};
use crate::lock::DirectoryLock;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Terminal state of a guarded key, as recorded by the marker files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Neither marker exists; the work has not completed.
    Pending,
    /// The work completed successfully.
    Done,
    /// The work failed; carries the stored error text.
    Failed(String),
}

impl std::fmt::Display for GuardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardState::Pending => write!(f, "pending"),
            GuardState::Done => write!(f, "done"),
            GuardState::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Ensures a unit of work is performed at most once per `(base, name)`.
///
/// ```no_run
/// use mkonce::guard::OnceGuard;
///
/// let guard = OnceGuard::new("/mnt/nfs/session", "hdl_compile")?;
/// guard.ensure_done(|| compile_everything())?;
/// # fn compile_everything() -> Result<(), String> { Ok(()) }
/// # Ok::<(), mkonce::MkonceError>(())
/// ```
#[derive(Debug)]
pub struct OnceGuard {
    base: PathBuf,
    name: String,
    timeout: Option<Duration>,
}

impl OnceGuard {
    /// Create a guard for `(base, name)` with the default lock timeout.
    ///
    /// `name` keys the marker and lock filenames, so it must be non-empty
    /// and must not contain path separators.
    pub fn new(base: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(MkonceError::UserError(format!(
                "invalid guard name '{}': must be non-empty and contain no path separators",
                name
            )));
        }
        Ok(Self {
            base: base.into(),
            name,
            timeout: Some(crate::lock::DEFAULT_TIMEOUT),
        })
    }

    /// Maximum wait for the underlying lock; `None` waits forever.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The guard's key name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base directory holding the markers and lock for this key.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Path of the lock directory used on the slow path.
    pub fn lock_path(&self) -> PathBuf {
        self.base.join(format!("{}.lock", self.name))
    }

    /// Path of the success marker.
    pub fn done_path(&self) -> PathBuf {
        self.base.join(format!("{}.done", self.name))
    }

    /// Path of the failure marker.
    pub fn failed_path(&self) -> PathBuf {
        self.base.join(format!("{}.failed", self.name))
    }

    /// Execute `work` unless it already ran for this key.
    ///
    /// Every caller either observes successful completion, observes the
    /// stored failure, or is the single caller that actually executes the
    /// work. The fast paths never take the lock; the slow path holds it
    /// across the marker re-check, the work, and the marker write, and
    /// releases it on every exit.
    pub fn ensure_done<F, E>(&self, work: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<(), E>,
        E: Display,
    {
        // Fast paths: a terminal marker means no lock is needed.
        if nfs_file_exists(&self.done_path()) {
            debug!(name = %self.name, "already complete");
            return Ok(());
        }
        if nfs_file_exists(&self.failed_path()) {
            return Err(self.stored_failure());
        }

        fs::create_dir_all(&self.base).map_err(|e| MkonceError::io(&self.base, e))?;

        let lock = DirectoryLock::new(self.lock_path()).timeout(self.timeout);
        let _held = lock.acquire()?;

        // Another holder may have finished between the fast path and lock
        // acquisition; re-check both markers under the lock.
        if nfs_file_exists(&self.done_path()) {
            debug!(name = %self.name, "completed while waiting for lock");
            return Ok(());
        }
        if nfs_file_exists(&self.failed_path()) {
            return Err(self.stored_failure());
        }

        info!(name = %self.name, base = %self.base.display(), "executing guarded step");
        match work() {
            Ok(()) => {
                write_durable(&self.done_path(), b"")?;
                info!(name = %self.name, "guarded step complete");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                // Best-effort: a marker write failure must not mask the
                // work's own failure.
                if let Err(marker_err) = write_durable(&self.failed_path(), message.as_bytes()) {
                    warn!(
                        name = %self.name,
                        error = %marker_err,
                        "failed to record failure marker"
                    );
                }
                Err(MkonceError::GuardFailure {
                    name: self.name.clone(),
                    message,
                })
            }
        }
    }

    /// Report the key's terminal state without taking the lock.
    pub fn state(&self) -> GuardState {
        if nfs_file_exists(&self.done_path()) {
            return GuardState::Done;
        }
        if nfs_file_exists(&self.failed_path()) {
            return GuardState::Failed(self.read_failure_text());
        }
        GuardState::Pending
    }

    /// Remove both markers, permitting the work to run again.
    ///
    /// Not safe to call concurrently with an in-flight `ensure_done` on
    /// the same key; callers serialize reset against active use.
    pub fn reset(&self) -> Result<()> {
        remove_if_exists(&self.done_path())?;
        remove_if_exists(&self.failed_path())?;
        debug!(name = %self.name, "guard reset");
        Ok(())
    }

    fn read_failure_text(&self) -> String {
        fs::read_to_string(self.failed_path())
            .unwrap_or_else(|_| "<unreadable failure marker>".to_string())
    }

    fn stored_failure(&self) -> MkonceError {
        MkonceError::GuardFailure {
            name: self.name.clone(),
            message: self.read_failure_text(),
        }
    }
}

/// Convenience constructor matching the collaborator interface: build a
/// guard from `(base_directory, name, timeout)`.
pub fn once_guard(
    base: impl Into<PathBuf>,
    name: impl Into<String>,
    timeout: Option<Duration>,
) -> Result<OnceGuard> {
    Ok(OnceGuard::new(base, name)?.timeout(timeout))
}
