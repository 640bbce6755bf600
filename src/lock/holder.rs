//! Holder record stored inside an acquired lock directory.

use crate::error::{MkonceError, Result};
use crate::fs::write_durable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the holder record file inside the lock directory.
pub const HOLDER_FILE: &str = "holder.info";

/// Identity of the process currently holding a lock.
///
/// Read by contenders that find the lock directory already present, and
/// used for the staleness decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderInfo {
    /// Hostname of the lock holder.
    pub hostname: String,

    /// Process ID of the lock holder.
    pub pid: u32,

    /// Timestamp when the lock was acquired (RFC3339).
    pub acquired_at: DateTime<Utc>,
}

impl HolderInfo {
    /// Create a holder record for the current process.
    pub fn for_current_process() -> Self {
        Self {
            hostname: local_hostname(),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }

    /// Parse a holder record from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MkonceError::io(path, e))?;

        serde_json::from_str(&content).map_err(|e| {
            MkonceError::UserError(format!(
                "failed to parse holder record '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the record to `path` with fsync of the file and its parent
    /// directory, so it is visible to other NFS clients before the lock is
    /// considered fully acquired.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            MkonceError::UserError(format!("failed to serialize holder record: {}", e))
        })?;
        write_durable(path, json.as_bytes())
    }

    /// Age of the lock as observed from the local clock.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.acquired_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", seconds.max(0))
        }
    }
}

/// Hostname of the local machine, or "unknown" when it cannot be read.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_identifies_current_process() {
        let info = HolderInfo::for_current_process();

        assert!(!info.hostname.is_empty());
        assert_eq!(info.pid, std::process::id());
        assert!(info.age().num_seconds() < 60);
    }

    #[test]
    fn record_round_trips_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(HOLDER_FILE);

        let info = HolderInfo::for_current_process();
        info.write_to(&path).unwrap();

        let parsed = HolderInfo::from_file(&path).unwrap();
        assert_eq!(parsed.hostname, info.hostname);
        assert_eq!(parsed.pid, info.pid);
        assert_eq!(parsed.acquired_at, info.acquired_at);
    }

    #[test]
    fn record_file_is_plain_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(HOLDER_FILE);

        HolderInfo::for_current_process().write_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value.get("hostname").is_some());
        assert!(value.get("pid").is_some());
        assert!(value.get("acquired_at").is_some());
    }

    #[test]
    fn unparsable_record_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(HOLDER_FILE);
        std::fs::write(&path, "not json").unwrap();

        assert!(HolderInfo::from_file(&path).is_err());
    }

    #[test]
    fn age_string_scales_with_age() {
        let mut info = HolderInfo::for_current_process();
        assert!(info.age_string().ends_with('s'));

        info.acquired_at = Utc::now() - chrono::Duration::minutes(5);
        assert_eq!(info.age_string(), "5m");

        info.acquired_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.age_string().starts_with("2h"));

        info.acquired_at = Utc::now() - chrono::Duration::days(3);
        assert!(info.age_string().starts_with("3d"));
    }
}
