//! Display-level infrastructure: the minimal ambient logging facility the
//! core owns for itself. A richer operator-facing logging facility
//! remains an external collaborator.
//!
//! A crate-level atomic display level gates `eprintln!` calls, rather than
//! pulling in `log`/`tracing`.

use std::sync::atomic::{AtomicU32, Ordering};

pub const PROGRAM_NAME: &str = "vbsutil";

// 0 = silent; 1 = errors/warnings (non-ENOENT enumeration failures); 2 = normal.
pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(1);

/// Returns the current display level.
#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Sets the display level.
#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Conditionally print a warning to stderr at or above `level` — the
/// "logged" half of "silent on ENOENT, logged-and-skip on other stat
/// errors".
#[macro_export]
macro_rules! vbs_warn {
    ($level:expr, $($arg:tt)*) => {
        if $crate::cli::constants::display_level() >= $level {
            eprint!("{}: ", $crate::cli::constants::PROGRAM_NAME);
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_level_round_trips() {
        let prev = display_level();
        set_display_level(3);
        assert_eq!(display_level(), 3);
        set_display_level(prev);
    }
}
