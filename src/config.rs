// config.rs — runtime/compile-time configuration constants.
//
// A small set of constants, a couple overridable by environment variable,
// rather than a process-wide configuration object.

use std::sync::OnceLock;

/// Sentinel value meaning "this chunk's lazily-opened descriptor is not
/// currently open". Chosen as the maximum value representable by a raw fd
/// so it can never collide with a real descriptor ("Invalid sentinel fd").
pub const NO_FD: i32 = i32::MAX;

/// First handle value handed out when the handle table is empty (handle
/// table allocation rule: empty table -> this sentinel, else smallest
/// existing handle minus one).
pub const FIRST_HANDLE: i64 = -10_000;

/// Default cap on the number of worker threads used by the block-header
/// discovery strategy (one worker per mountpoint, capped so a caller
/// passing an unreasonably long mountpoint list doesn't spawn thousands of
/// OS threads). Overridable via `VBS_DISCOVERY_THREADS`.
pub const DISCOVERY_THREADS_MAX_DEFAULT: usize = 64;

fn discovery_threads_max_override() -> Option<usize> {
    std::env::var("VBS_DISCOVERY_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Returns the maximum number of discovery worker threads to spawn,
/// honoring `VBS_DISCOVERY_THREADS` if set to a positive integer.
pub fn discovery_threads_max() -> usize {
    static CACHED: OnceLock<usize> = OnceLock::new();
    *CACHED.get_or_init(|| {
        discovery_threads_max_override().unwrap_or(DISCOVERY_THREADS_MAX_DEFAULT)
    })
}
