//! One piece of a recording.

use std::path::PathBuf;

use crate::config::NO_FD;

/// Where a chunk's bytes physically live.
#[derive(Debug)]
pub enum ChunkSource {
    /// The whole file is this chunk; payload starts at offset 0.
    /// `fd` is the lazily opened, exclusively owned descriptor for `path`,
    /// `NO_FD` when not currently open.
    Scattered { path: PathBuf, fd: i32 },
    /// A slice of a file shared with other chunks in the same mountpoint.
    /// `descriptor` indexes into the owning [`crate::vfile::VirtualFile`]'s
    /// descriptor pool — this chunk borrows it, never closes it.
    BlockHeader { descriptor: usize, position: u64 },
}

/// One piece of a recording: its physical source, size, position within
/// that source, logical sequence number, and (once a virtual file is built)
/// its offset in the logical stream.
#[derive(Debug)]
pub struct Chunk {
    pub sequence_number: u64,
    pub size: u64,
    /// Assigned once, when the virtual file is constructed. Zero
    /// until then.
    pub logical_offset: u64,
    pub source: ChunkSource,
}

impl Chunk {
    pub fn new_scattered(sequence_number: u64, size: u64, path: PathBuf) -> Self {
        Chunk {
            sequence_number,
            size,
            logical_offset: 0,
            source: ChunkSource::Scattered { path, fd: NO_FD },
        }
    }

    pub fn new_block_header(sequence_number: u64, size: u64, descriptor: usize, position: u64) -> Self {
        Chunk {
            sequence_number,
            size,
            logical_offset: 0,
            source: ChunkSource::BlockHeader { descriptor, position },
        }
    }

    /// The chunk's position within its physical source: 0 for scattered
    /// chunks, the payload start offset for block-header chunks.
    pub fn position(&self) -> u64 {
        match &self.source {
            ChunkSource::Scattered { .. } => 0,
            ChunkSource::BlockHeader { position, .. } => *position,
        }
    }

    /// Exclusive end of this chunk in the logical stream.
    pub fn logical_end(&self) -> u64 {
        self.logical_offset + self.size
    }

    /// Returns a copy of this chunk with its lazy descriptor unopened
    /// (scattered) or pointing at the same shared-descriptor index
    /// (block-header). Used by [`crate::vfile::VirtualFile::duplicate`] so a
    /// copy never inherits the source's open descriptors.
    pub fn cloned_unopened(&self) -> Chunk {
        let source = match &self.source {
            ChunkSource::Scattered { path, .. } => ChunkSource::Scattered {
                path: path.clone(),
                fd: NO_FD,
            },
            ChunkSource::BlockHeader { descriptor, position } => ChunkSource::BlockHeader {
                descriptor: *descriptor,
                position: *position,
            },
        };
        Chunk {
            sequence_number: self.sequence_number,
            size: self.size,
            logical_offset: self.logical_offset,
            source,
        }
    }
}
