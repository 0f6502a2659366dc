//! Exit codes for helmwrap runs
//!
//! A failing Helm command passes its own exit code through unchanged; the
//! codes here cover everything else. They follow sysexits.h and shell
//! conventions so they stay apart from Helm's usual status 1.

/// Success - every stage completed
pub const SUCCESS: i32 = 0;

/// Engine error - config, archive, or dependency stage failed before the
/// primary Helm command ran (EX_SOFTWARE)
pub const ENGINE_ERROR: i32 = 70;

/// The Helm binary could not be started for the primary command
pub const COMMAND_NOT_FOUND: i32 = 127;

/// Base for a child terminated by a signal (128 + signal number)
pub const SIGNAL_BASE: i32 = 128;
