//! The virtual file: the open-file state built from a discovered chunk set.
//!
//! A `VirtualFile` owns the ordered chunks, the descriptor pool shared by
//! block-header chunks, a current logical position, and a cursor into the
//! chunk vector. Scattered chunks are lazily opened via `pread` on a raw fd
//! kept directly on the [`Chunk`]; block-header chunks read from a `File`
//! owned here, via `read_at` so no seek state needs to be threaded through
//! reads.

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::chunk::{Chunk, ChunkSource, OrderedChunkSet};
use crate::config::NO_FD;
use crate::error::{VbsError, VbsResult};

/// `seek`'s reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// The open-file state for one discovered recording.
pub struct VirtualFile {
    /// Ordered by `sequence_number`, with `logical_offset` assigned.
    chunks: Vec<Chunk>,
    /// Descriptors opened by the block-header strategy; owned here, not by
    /// any single chunk.
    block_fds: Vec<File>,
    /// Total logical size: sum of all chunk sizes.
    size: u64,
    /// Current logical read/seek position.
    position: u64,
    /// Index into `chunks` of the chunk containing `position`;
    /// `chunks.len()` is the end-of-stream sentinel.
    cursor: usize,
}

impl VirtualFile {
    /// Builds a virtual file from a non-empty discovered chunk set,
    /// assigning each chunk's `logical_offset` in sequence-number order.
    /// Callers are expected to have already rejected an empty `set` with
    /// `NotFound`.
    pub fn new(set: OrderedChunkSet, block_fds: Vec<File>) -> VbsResult<Self> {
        let mut chunks = set.into_sorted_vec();
        if chunks.is_empty() {
            return Err(VbsError::NotFound);
        }

        let mut running_total = 0u64;
        for chunk in chunks.iter_mut() {
            chunk.logical_offset = running_total;
            running_total += chunk.size;
        }

        Ok(VirtualFile {
            chunks,
            block_fds,
            size: running_total,
            position: 0,
            cursor: 0,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Produces an independent copy with its own cursor and position reset
    /// to 0. Block-header descriptors are
    /// duplicated via `try_clone` since they are shared, not chunk-owned;
    /// scattered chunks start unopened in the copy. The intended use is a
    /// higher layer wanting concurrent access to the same recording without
    /// serializing through one handle.
    pub fn duplicate(&self) -> VbsResult<VirtualFile> {
        let block_fds = self
            .block_fds
            .iter()
            .map(File::try_clone)
            .collect::<io::Result<Vec<File>>>()?;
        let chunks = self.chunks.iter().map(Chunk::cloned_unopened).collect();

        Ok(VirtualFile {
            chunks,
            block_fds,
            size: self.size,
            position: 0,
            cursor: 0,
        })
    }

    /// Returns the index of the chunk whose `[logical_offset,
    /// logical_offset+size)` range contains `position`, or `chunks.len()`
    /// if `position >= size` (end sentinel).
    fn chunk_index_for_position(&self, position: u64) -> usize {
        if position >= self.size {
            return self.chunks.len();
        }
        self.chunks
            .binary_search_by(|c| {
                if position < c.logical_offset {
                    std::cmp::Ordering::Greater
                } else if position >= c.logical_end() {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .unwrap_or(self.chunks.len())
    }

    /// Closes the current cursor chunk's lazily-opened scattered descriptor,
    /// if any.
    fn release_cursor_fd(&mut self) {
        if let Some(chunk) = self.chunks.get_mut(self.cursor) {
            if let ChunkSource::Scattered { fd, .. } = &mut chunk.source {
                if *fd != NO_FD {
                    raw_close(*fd);
                    *fd = NO_FD;
                }
            }
        }
    }

    /// Computes a new position from `(whence, offset)` and repositions the
    /// cursor.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> VbsResult<u64> {
        let base: i64 = match whence {
            Whence::Set => 0,
            Whence::Cur => self
                .position
                .try_into()
                .map_err(|_| VbsError::InvalidArgument("current position too large to seek from"))?,
            Whence::End => self
                .size
                .try_into()
                .map_err(|_| VbsError::InvalidArgument("size too large to seek from"))?,
        };
        let new_position = base
            .checked_add(offset)
            .ok_or(VbsError::InvalidArgument("seek offset overflows"))?;
        if new_position < 0 {
            return Err(VbsError::InvalidArgument("seek would land before the start of the stream"));
        }
        let new_position = new_position as u64;

        let new_cursor = self.chunk_index_for_position(new_position);
        if new_cursor != self.cursor {
            self.release_cursor_fd();
            self.cursor = new_cursor;
        }
        self.position = new_position;
        Ok(self.position)
    }

    /// Reads up to `buf.len()` bytes starting at the current position,
    /// advancing both `position` and the cursor.
    ///
    /// A short read (fewer bytes than requested) signals either EOF or a
    /// non-fatal per-chunk I/O error; the bytes served so far are always
    /// returned rather than propagated as an error, except when zero bytes
    /// have been served and the very first chunk access fails.
    pub fn read(&mut self, buf: &mut [u8]) -> VbsResult<usize> {
        let want_total = buf.len();
        if want_total == 0 {
            return Ok(0);
        }

        let mut served = 0usize;
        while served < want_total {
            if self.cursor >= self.chunks.len() {
                break; // past the last chunk: EOF
            }

            let logical_end = self.chunks[self.cursor].logical_end();
            if self.position >= logical_end {
                self.release_cursor_fd();
                self.cursor += 1;
                continue;
            }

            let available = logical_end - self.position;
            let want = (want_total - served) as u64;
            let to_read = want.min(available) as usize;

            let idx = self.cursor;
            let chunk_offset;
            {
                let chunk = &self.chunks[idx];
                chunk_offset = chunk.position() + (self.position - chunk.logical_offset);
            }

            match self.read_chunk(idx, chunk_offset, &mut buf[served..served + to_read]) {
                Ok(0) => {
                    // The chunk's backing file is shorter than its recorded
                    // size; treat as exhausted and move to the next chunk.
                    self.release_cursor_fd();
                    self.cursor += 1;
                }
                Ok(n) => {
                    served += n;
                    self.position += n as u64;
                }
                Err(_) if served > 0 => break,
                Err(e) => return Err(e),
            }
        }

        Ok(served)
    }

    fn read_chunk(&mut self, idx: usize, src_offset: u64, dst: &mut [u8]) -> VbsResult<usize> {
        let chunk = &mut self.chunks[idx];
        match &mut chunk.source {
            ChunkSource::Scattered { path, fd } => {
                if *fd == NO_FD {
                    *fd = raw_open_readonly(path)?;
                }
                raw_pread(*fd, dst, src_offset).map_err(VbsError::Io)
            }
            ChunkSource::BlockHeader { descriptor, .. } => {
                let file = self
                    .block_fds
                    .get(*descriptor)
                    .ok_or_else(|| VbsError::Io(io::Error::other("invalid block descriptor index")))?;
                file.read_at(dst, src_offset).map_err(VbsError::Io)
            }
        }
    }
}

impl Drop for VirtualFile {
    /// Releases every still-open scattered descriptor, then explicitly
    /// closes the block-header descriptor pool (distinct-by-value, each
    /// closed exactly once) rather than leaving it to an implicit `Vec`
    /// drop.
    fn drop(&mut self) {
        for chunk in &mut self.chunks {
            if let ChunkSource::Scattered { fd, .. } = &mut chunk.source {
                if *fd != NO_FD {
                    raw_close(*fd);
                    *fd = NO_FD;
                }
            }
        }
        crate::discovery::block_header::close_descriptors(std::mem::take(&mut self.block_fds));
    }
}

// ── Raw scattered-descriptor I/O ─────────────────────────────────────────────
//
// Scattered chunks keep a raw fd directly on the chunk record rather than a
// `std::fs::File`. `pread` folds seek-then-read into one syscall, which also
// avoids mutable aliasing concerns since `read_chunk` only needs `&dst`.

fn raw_open_readonly(path: &Path) -> VbsResult<i32> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| VbsError::Io(io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte")))?;
    let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY) };
    if fd < 0 {
        return Err(VbsError::Io(io::Error::last_os_error()));
    }
    Ok(fd)
}

fn raw_pread(fd: i32, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let n = unsafe { libc::pread(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), offset as libc::off_t) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

fn raw_close(fd: i32) {
    unsafe {
        libc::close(fd);
    }
}
