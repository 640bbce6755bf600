//! Exit code constants for the mkonce CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid name, invalid state)
//! - 2: Guard failure (the guarded command failed, now or previously)
//! - 3: I/O failure (filesystem error unrelated to contention)
//! - 4: Lock acquisition timeout

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an invalid operation.
pub const USER_ERROR: i32 = 1;

/// Guard failure: the guarded command failed, or a previous failure marker
/// is still present.
pub const GUARD_FAILURE: i32 = 2;

/// I/O failure: the filesystem misbehaved outside of lock contention.
pub const IO_FAILURE: i32 = 3;

/// Lock acquisition timeout: the lock stayed held past the timeout.
pub const LOCK_TIMEOUT: i32 = 4;
