//! Filesystem utilities for mkonce.
//!
//! Durability helpers for state shared over NFS: every record other
//! participants rely on is fsync'd (data and containing directory) before
//! it is considered written, and existence checks defeat the NFS client's
//! dentry cache.

pub mod durable;

pub use durable::fsync_dir;
pub use durable::nfs_file_exists;
pub use durable::remove_if_exists;
pub use durable::write_durable;
