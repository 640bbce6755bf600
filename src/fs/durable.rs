//! Durable writes and NFS-cache-safe existence checks.
//!
//! NFS clients may cache directory contents and file attributes. Two rules
//! keep shared state trustworthy across nodes:
//!
//! 1. A file another participant will read is only "written" once both the
//!    file and its parent directory have been fsync'd.
//! 2. Existence of such a file is checked by opening the parent directory
//!    (which forces dentry revalidation) and then opening the file itself,
//!    never by `stat` alone.

use crate::error::{MkonceError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Fsync a directory so new or removed entries reach stable storage.
pub fn fsync_dir(dir: &Path) -> std::io::Result<()> {
    let handle = File::open(dir)?;
    handle.sync_all()
}

/// Write `content` to `path`, then fsync the file and its parent directory.
///
/// Creates or truncates the file in place; the callers here are markers and
/// holder records whose existence alone is the signal, so a torn write is
/// only possible before the lock protocol considers them valid.
pub fn write_durable(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| MkonceError::io(path, e))?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        MkonceError::io(path, e)
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        MkonceError::io(path, e)
    })?;

    if let Some(parent) = path.parent() {
        fsync_dir(parent).map_err(|e| MkonceError::io(parent, e))?;
    }

    Ok(())
}

/// Check file existence in an NFS-cache-safe way.
///
/// Opening the parent directory forces the NFS client to revalidate its
/// dentry cache; opening the file itself avoids `stat` results served from
/// the attribute cache.
pub fn nfs_file_exists(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };

    if File::open(parent).is_err() {
        return false;
    }

    File::open(path).is_ok()
}

/// Remove a file, tolerating it already being gone.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MkonceError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_durable_creates_file_with_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");

        write_durable(&path, b"{\"pid\":42}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"pid\":42}");
    }

    #[test]
    fn write_durable_truncates_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");

        fs::write(&path, "old content, longer than the new one").unwrap();
        write_durable(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn write_durable_empty_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("marker.done");

        write_durable(&path, b"").unwrap();

        assert!(path.exists());
        assert!(fs::read(&path).unwrap().is_empty());
    }

    #[test]
    fn write_durable_missing_parent_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no_such_dir").join("marker");

        let err = write_durable(&path, b"x").unwrap_err();
        assert!(matches!(err, MkonceError::Io { .. }));
    }

    #[test]
    fn fsync_dir_succeeds_on_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        fsync_dir(temp_dir.path()).unwrap();
    }

    #[test]
    fn nfs_file_exists_true_for_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("marker");
        fs::write(&path, "").unwrap();

        assert!(nfs_file_exists(&path));
    }

    #[test]
    fn nfs_file_exists_false_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!nfs_file_exists(&temp_dir.path().join("no_such_file")));
    }

    #[test]
    fn nfs_file_exists_false_for_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no_dir").join("file");
        assert!(!nfs_file_exists(&path));
    }

    #[test]
    fn remove_if_exists_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        remove_if_exists(&temp_dir.path().join("never_created")).unwrap();
    }

    #[test]
    fn remove_if_exists_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("marker");
        fs::write(&path, "").unwrap();

        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
