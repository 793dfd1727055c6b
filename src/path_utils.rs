//! Path and name-matching helpers used by the discovery engine.
//!
//! `escape` builds a regex-safe per-recording match pattern, and
//! `is_mountpoint` classifies a directory entry as a mountpoint (`disk<N>`).

use std::path::Path;

use nix::sys::stat::{lstat, SFlag};
use nix::unistd::{access, AccessFlags};

/// Escapes every character not in `[A-Za-z0-9_]` with a leading backslash,
/// so the result can be embedded in a regex and match the original string
/// literally.
///
/// `escape(s) == s` whenever `s` contains only `[A-Za-z0-9_]` characters.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Returns `true` iff `name` matches `^disk[0-9]+$`: literally `disk`
/// followed by one or more ASCII digits and nothing else.
fn looks_like_mountpoint_name(name: &str) -> bool {
    match name.strip_prefix("disk") {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Returns `true` iff `entry`'s basename matches `^disk[0-9]+$`, `lstat`
/// succeeds, it names a directory, and the caller has read+execute
/// permission on it. Symbolic links are not followed — `lstat`, not `stat`,
/// classifies the entry.
pub fn is_mountpoint(entry: &Path) -> bool {
    let Some(name) = entry.file_name() else {
        return false;
    };
    let Some(name) = name.to_str() else {
        return false;
    };
    if !looks_like_mountpoint_name(name) {
        return false;
    }

    let Ok(st) = lstat(entry) else {
        return false;
    };
    if SFlag::from_bits_truncate(st.st_mode) & SFlag::S_IFMT != SFlag::S_IFDIR {
        return false;
    }

    access(entry, AccessFlags::R_OK | AccessFlags::X_OK).is_ok()
}

/// Parses an exactly-8-digit decimal suffix (mandatory base-10, no octal
/// interpretation of leading zeros) into a sequence number. Returns `None`
/// if `suffix` is not exactly 8 ASCII digits.
pub fn parse_sequence_suffix(suffix: &str) -> Option<u64> {
    if suffix.len() != 8 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse::<u64>().ok()
}
