//! Directory-based locking for NFS-mounted shared storage.
//!
//! Advisory byte-range locks (`flock`/`fcntl`) may be process-local or
//! node-local on some NFS implementations. Directory creation is atomic on
//! all NFS protocol versions (exactly one caller among concurrent racers
//! succeeds), so the lock state here is a directory: present = held,
//! absent = free.
//!
//! # Holder Record
//!
//! Once the directory is created, the holder writes `holder.info` inside
//! it with JSON metadata:
//! - `hostname`: the holder's host
//! - `pid`: the holder's process ID
//! - `acquired_at`: RFC3339 timestamp
//!
//! The record is fsync'd (file and parent directory) before the lock is
//! considered fully acquired, so other NFS clients can read it.
//!
//! # Staleness
//!
//! A contender that finds the directory already present reads the holder
//! record. A same-host holder whose pid is no longer alive is stale
//! immediately; a different-host holder is stale only after
//! `stale_timeout`. Stale locks are broken and re-contended; removal races
//! are expected and retried, never surfaced.
//!
//! # RAII Guards
//!
//! Acquisition returns a [`LockGuard`] that removes the holder record and
//! the directory on drop. Releasing a lock that was stolen after being
//! declared stale is a non-fatal no-op.

mod acquire;
mod guard;
mod holder;
mod liveness;


pub use acquire::{
    DEFAULT_POLL_INTERVAL, DEFAULT_STALE_TIMEOUT, DEFAULT_TIMEOUT, DirectoryLock, LockStatus,
    force_clear, inspect,
};
pub use guard::LockGuard;
pub use holder::{HOLDER_FILE, HolderInfo};
pub use liveness::{LocalProbe, ProcessProbe};
