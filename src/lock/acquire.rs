//! Lock acquisition: the mkdir poll loop and staleness handling.

use super::guard::LockGuard;
use super::holder::{HOLDER_FILE, HolderInfo, local_hostname};
use super::liveness::{LocalProbe, ProcessProbe};
use crate::error::{MkonceError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default maximum wait for acquisition.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default sleep between acquisition attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default age after which a different-host lock is presumed abandoned.
pub const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(7200);

/// An exclusive cross-process, cross-node lock keyed by a directory path.
///
/// The directory itself is the lock state: present = held, absent = free.
/// Construct with [`DirectoryLock::new`] and adjust the timing knobs with
/// the consuming setters; every instance is self-contained.
///
/// ```no_run
/// use mkonce::lock::DirectoryLock;
/// use std::time::Duration;
///
/// let lock = DirectoryLock::new("/mnt/nfs/build/.lock")
///     .timeout(Some(Duration::from_secs(5)))
///     .poll_interval(Duration::from_millis(50));
/// let guard = lock.acquire()?;
/// // ... critical section ...
/// drop(guard);
/// # Ok::<(), mkonce::MkonceError>(())
/// ```
pub struct DirectoryLock {
    lock_path: PathBuf,
    timeout: Option<Duration>,
    poll_interval: Duration,
    stale_timeout: Duration,
    probe: Box<dyn ProcessProbe>,
}

impl std::fmt::Debug for DirectoryLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryLock")
            .field("lock_path", &self.lock_path)
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("stale_timeout", &self.stale_timeout)
            .finish_non_exhaustive()
    }
}

/// Observed state of a lock path, as reported by [`inspect`].
#[derive(Debug, Clone)]
pub enum LockStatus {
    /// The lock directory does not exist.
    Free,
    /// The lock is held and its holder record was readable.
    Held(HolderInfo),
    /// The lock directory exists but the holder record is missing or
    /// unreadable (an acquirer may be mid-write, or the record was lost).
    HeldUnknown,
}

impl DirectoryLock {
    /// Create a lock handle for `lock_path` with default timing.
    pub fn new(lock_path: impl Into<PathBuf>) -> Self {
        Self {
            lock_path: lock_path.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_timeout: DEFAULT_STALE_TIMEOUT,
            probe: Box::new(LocalProbe),
        }
    }

    /// Maximum wait for acquisition; `None` waits forever.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sleep between acquisition attempts.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Age after which a different-host holder is presumed abandoned.
    pub fn stale_timeout(mut self, stale_timeout: Duration) -> Self {
        self.stale_timeout = stale_timeout;
        self
    }

    /// Substitute the process-liveness probe.
    pub fn probe(mut self, probe: impl ProcessProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Path of the lock directory.
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    fn holder_path(&self) -> PathBuf {
        self.lock_path.join(HOLDER_FILE)
    }

    /// Block until the lock directory is created (= lock acquired).
    ///
    /// Polls every `poll_interval`, breaking stale locks along the way.
    /// Fails with [`MkonceError::LockTimeout`] once the configured timeout
    /// elapses; the deadline is checked once per iteration, so overshoot
    /// is bounded by `poll_interval`. Filesystem errors other than
    /// "directory already exists" propagate immediately; they are not
    /// contention.
    pub fn acquire(&self) -> Result<LockGuard> {
        let start = Instant::now();

        loop {
            match fs::create_dir(&self.lock_path) {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if self.try_break_stale() {
                        // Stale lock broken; retry mkdir immediately.
                        continue;
                    }
                    let elapsed = start.elapsed();
                    if let Some(timeout) = self.timeout
                        && elapsed >= timeout
                    {
                        return Err(MkonceError::LockTimeout {
                            path: self.lock_path.clone(),
                            timeout_secs: timeout.as_secs_f64(),
                            elapsed_secs: elapsed.as_secs_f64(),
                        });
                    }
                    std::thread::sleep(self.poll_interval);
                }
                Err(e) => return Err(MkonceError::io(&self.lock_path, e)),
            }
        }

        // The guard is constructed before the holder record is written so
        // the directory is removed again if the write fails.
        let guard = LockGuard::new(self.lock_path.clone());
        HolderInfo::for_current_process().write_to(&self.holder_path())?;
        debug!(path = %self.lock_path.display(), "acquired lock");
        Ok(guard)
    }

    /// Break the existing lock if its holder is provably gone.
    ///
    /// Returns true when the directory was removed and mkdir should be
    /// retried immediately. A missing or unreadable holder record means a
    /// racing acquirer may not have written it yet, so it is not stale. Removal
    /// races (another contender broke or re-acquired the lock first) make
    /// the rmdir fail, which is also "not broken by us".
    fn try_break_stale(&self) -> bool {
        let Ok(holder) = HolderInfo::from_file(&self.holder_path()) else {
            return false;
        };

        if !self.is_stale(&holder) {
            return false;
        }

        info!(
            path = %self.lock_path.display(),
            holder_host = %holder.hostname,
            holder_pid = holder.pid,
            "breaking stale lock"
        );
        let _ = fs::remove_file(self.holder_path());
        fs::remove_dir(&self.lock_path).is_ok()
    }

    fn is_stale(&self, holder: &HolderInfo) -> bool {
        if holder.hostname == local_hostname() {
            // Same host: a dead pid makes the lock stale immediately.
            return !self.probe.is_alive(holder.pid);
        }

        // Different host: liveness cannot be verified remotely, so fall
        // back to time-based expiry. A negative age (holder clock ahead of
        // ours) is not stale.
        match holder.age().to_std() {
            Ok(age) => age > self.stale_timeout,
            Err(_) => false,
        }
    }
}

/// Report the state of a lock path without contending for it.
pub fn inspect(lock_path: &Path) -> LockStatus {
    if !lock_path.is_dir() {
        return LockStatus::Free;
    }
    match HolderInfo::from_file(&lock_path.join(HOLDER_FILE)) {
        Ok(holder) => LockStatus::Held(holder),
        Err(_) => LockStatus::HeldUnknown,
    }
}

/// Force-remove a lock directory regardless of holder state.
///
/// The caller is responsible for verifying that clearing is appropriate
/// (e.g. a `--force` flag). Fails if the lock does not exist.
pub fn force_clear(lock_path: &Path) -> Result<LockStatus> {
    let status = inspect(lock_path);
    if matches!(status, LockStatus::Free) {
        return Err(MkonceError::UserError(format!(
            "lock '{}' does not exist",
            lock_path.display()
        )));
    }

    match fs::remove_file(lock_path.join(HOLDER_FILE)) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(MkonceError::io(lock_path.join(HOLDER_FILE), e)),
    }
    fs::remove_dir(lock_path).map_err(|e| MkonceError::io(lock_path, e))?;

    Ok(status)
}
