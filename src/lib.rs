//! mkonce: NFS-safe directory locking and run-exactly-once coordination.
//!
//! Many independent worker processes, possibly on different physical
//! hosts sharing only a network filesystem, sometimes need one expensive
//! build step to happen exactly once. Advisory file
//! locks are unreliable over NFS; directory creation is atomic on every
//! NFS protocol version. This crate builds on that primitive:
//!
//! - [`lock::DirectoryLock`]: an exclusive cross-node lock backed by
//!   `mkdir`/`rmdir`, with timeout, polling, and stale-lock reclamation.
//! - [`guard::OnceGuard`]: a call-once coordinator layered on the lock,
//!   using durable done/failed marker files for idempotent
//!   short-circuiting.
//!
//! The `mkonce` binary wraps the same machinery for shell callers.

pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod guard;
pub mod lock;

pub use error::{MkonceError, Result};
pub use guard::{GuardState, OnceGuard, once_guard};
pub use lock::{DirectoryLock, LockGuard};
