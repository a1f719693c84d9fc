//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - sweep completed (individual deletion failures are reported, not fatal)
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - missing owner/package/token, malformed pattern or policy file
pub const CONFIG_ERROR: i32 = 2;

/// Inventory error - a package listing page failed, nothing was deleted
pub const INVENTORY_ERROR: i32 = 3;

/// Unsafe to collect - live tags failed to resolve under --strict, nothing was deleted
pub const UNSAFE_TO_COLLECT: i32 = 4;

/// IO error - policy file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
