//! Process liveness probing for same-host staleness decisions.

/// Capability for checking whether a lock holder's process is still alive.
///
/// Injected into [`DirectoryLock`](super::DirectoryLock) so tests and
/// unusual platforms can substitute their own probe. Only consulted for
/// holders recorded on the local host; remote holders fall back to the
/// time-based staleness path.
pub trait ProcessProbe: Send + Sync {
    /// Whether a process with this pid exists on the local host.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Default probe: `kill(pid, 0)` sends no signal but reports existence.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalProbe;

impl ProcessProbe for LocalProbe {
    fn is_alive(&self, pid: u32) -> bool {
        // SAFETY: kill with signal 0 performs only the existence and
        // permission checks; no signal is delivered.
        let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
        if rc == 0 {
            return true;
        }

        // EPERM: the process exists but we may not signal it. Any errno
        // other than ESRCH is treated as alive, since a false "dead" would let
        // a contender reclaim a live holder's lock.
        let errno = std::io::Error::last_os_error().raw_os_error();
        errno == Some(libc::EPERM)
    }
}
