//! Error types for mkonce.
//!
//! Uses thiserror for derive macros. Each variant maps to a distinct exit
//! code so shell callers of the `mkonce` binary can tell a timed-out lock
//! apart from a failed guarded step.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mkonce operations.
#[derive(Error, Debug)]
pub enum MkonceError {
    /// The lock could not be acquired within the configured timeout.
    ///
    /// Carries the lock path and how long the caller actually waited.
    /// Recoverable: the caller may retry or escalate.
    #[error(
        "could not acquire lock '{}' within {timeout_secs:.1}s (waited {elapsed_secs:.1}s)",
        path.display()
    )]
    LockTimeout {
        path: PathBuf,
        timeout_secs: f64,
        elapsed_secs: f64,
    },

    /// Underlying filesystem failure unrelated to lock contention.
    ///
    /// Permission or missing-path errors are never treated as staleness;
    /// they propagate with the offending path attached.
    #[error("I/O failure on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The guarded work failed, either in this call or in a previous one
    /// whose failure marker is still present.
    #[error("guarded step '{name}' failed: {message}")]
    GuardFailure { name: String, message: String },

    /// User provided invalid arguments or asked for an invalid operation.
    #[error("{0}")]
    UserError(String),
}

impl MkonceError {
    /// Attach a path to an `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MkonceError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            MkonceError::LockTimeout { .. } => exit_codes::LOCK_TIMEOUT,
            MkonceError::Io { .. } => exit_codes::IO_FAILURE,
            MkonceError::GuardFailure { .. } => exit_codes::GUARD_FAILURE,
            MkonceError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for mkonce operations.
pub type Result<T> = std::result::Result<T, MkonceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn lock_timeout_has_correct_exit_code() {
        let err = MkonceError::LockTimeout {
            path: PathBuf::from("/tmp/x.lock"),
            timeout_secs: 0.2,
            elapsed_secs: 0.25,
        };
        assert_eq!(err.exit_code(), exit_codes::LOCK_TIMEOUT);
    }

    #[test]
    fn io_error_has_correct_exit_code() {
        let err = MkonceError::io(
            Path::new("/tmp/x"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
    }

    #[test]
    fn guard_failure_has_correct_exit_code() {
        let err = MkonceError::GuardFailure {
            name: "hdl_compile".to_string(),
            message: "compile error".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::GUARD_FAILURE);
    }

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = MkonceError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = MkonceError::LockTimeout {
            path: PathBuf::from("/mnt/nfs/build/.lock"),
            timeout_secs: 0.2,
            elapsed_secs: 0.3,
        };
        let msg = err.to_string();
        assert!(msg.contains("/mnt/nfs/build/.lock"));
        assert!(msg.contains("0.2s"));

        let err = MkonceError::GuardFailure {
            name: "build".to_string(),
            message: "exit status 2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "guarded step 'build' failed: exit status 2"
        );
    }
}
