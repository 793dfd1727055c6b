//! Error taxonomy for the discovery, virtual-file, and I/O-engine layers.
//!
//! Mirrors the plain, hand-rolled error enums used throughout the LZ4 core
//! (e.g. `block::compress::Lz4Error`) rather than reaching for a derive
//! macro: every variant is small and the mapping to a POSIX `errno` (see
//! [`VbsError::to_errno`]) is the only behaviour callers need beyond
//! `Display`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors produced by discovery, virtual-file construction, and the I/O
/// engine (`open`/`read`/`seek`/`close`).
#[derive(Debug)]
pub enum VbsError {
    /// Null/empty recording name, empty mountpoint list, invalid `whence`,
    /// or a seek that would land before the start of the stream.
    InvalidArgument(&'static str),
    /// A null read buffer was supplied.
    BadAddress,
    /// The handle does not refer to a currently open virtual file.
    BadHandle,
    /// Discovery produced no chunks at all.
    NotFound,
    /// Two chunks with the same `sequence_number` were discovered within a
    /// single source (one scattered directory, or one block-header file).
    DuplicateChunk { sequence_number: u64, source: PathBuf },
    /// A block header carried a non-positive `wb_size` or a negative
    /// `block_number`.
    CorruptBlockHeader { source: PathBuf, detail: &'static str },
    /// An OS-level failure during enumeration, open, stat, read, or seek.
    Io(io::Error),
}

impl fmt::Display for VbsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VbsError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            VbsError::BadAddress => write!(f, "bad address: null buffer"),
            VbsError::BadHandle => write!(f, "bad handle"),
            VbsError::NotFound => write!(f, "recording not found"),
            VbsError::DuplicateChunk { sequence_number, source } => write!(
                f,
                "duplicate chunk: sequence number {sequence_number} appears twice in {}",
                source.display()
            ),
            VbsError::CorruptBlockHeader { source, detail } => write!(
                f,
                "corrupt block header in {}: {detail}",
                source.display()
            ),
            VbsError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for VbsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VbsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for VbsError {
    fn from(e: io::Error) -> Self {
        VbsError::Io(e)
    }
}

impl VbsError {
    /// Maps this error onto the POSIX-style integer code the C-ABI
    /// surface returns via `errno`.
    pub fn to_errno(&self) -> i32 {
        match self {
            VbsError::InvalidArgument(_) => libc::EINVAL,
            VbsError::BadAddress => libc::EFAULT,
            VbsError::BadHandle => libc::EBADF,
            VbsError::NotFound => libc::ENOENT,
            VbsError::DuplicateChunk { .. } => libc::EEXIST,
            VbsError::CorruptBlockHeader { .. } => libc::EPROTO,
            VbsError::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

pub type VbsResult<T> = Result<T, VbsError>;
