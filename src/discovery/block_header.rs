//! Block-header-file discovery strategy.
//!
//! One worker thread per mountpoint (via [`crate::threadpool::TPool`], the
//! same bounded pool the block-header scan in the original design used for
//! its per-mountpoint fan-out
//! builds a private local chunk set and opens at most one file descriptor;
//! results are folded into the shared set and descriptor pool under a
//! mutex, never mutated directly, so duplicate detection stays
//! deterministic regardless of scheduling order.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};

use nix::sys::stat::{lstat, SFlag};

use crate::chunk::{Chunk, OrderedChunkSet};
use crate::config::discovery_threads_max;
use crate::error::VbsError;
use crate::threadpool::TPool;
use crate::vbs_warn;

use super::format::{BlockHeader, FileHeader, BLOCK_HEADER_SIZE, FILE_HEADER_SIZE};

/// Runs the block-header strategy across `mountpoints` for `recording_name`.
///
/// Returns the merged chunk set plus the open file descriptors it
/// references (one per mountpoint that contributed a recognized file).
/// Descriptor ownership passes to the caller (the virtual file under
/// construction) — chunks only carry an index into this vector.
pub fn discover(
    recording_name: &str,
    mountpoints: &[String],
) -> Result<(OrderedChunkSet, Vec<File>), VbsError> {
    if mountpoints.is_empty() {
        return Ok((OrderedChunkSet::new(), Vec::new()));
    }

    let nb_threads = mountpoints.len().min(discovery_threads_max()).max(1);
    let pool = TPool::new(nb_threads, mountpoints.len())
        .ok_or_else(|| VbsError::Io(io::Error::other("failed to start discovery thread pool")))?;

    let shared: Arc<Mutex<(OrderedChunkSet, Vec<File>)>> =
        Arc::new(Mutex::new((OrderedChunkSet::new(), Vec::new())));
    let hard_error: Arc<Mutex<Option<VbsError>>> = Arc::new(Mutex::new(None));

    for mountpoint in mountpoints {
        let shared = Arc::clone(&shared);
        let hard_error = Arc::clone(&hard_error);
        let recording_name = recording_name.to_string();
        let mountpoint = mountpoint.clone();

        pool.submit_job(Box::new(move || {
            match scan_mountpoint(&mountpoint, &recording_name) {
                Ok(Some((local_set, file))) => {
                    let mut guard = shared.lock().unwrap();
                    let (set, files) = &mut *guard;
                    let descriptor = files.len();
                    files.push(file);
                    for chunk in local_set.into_sorted_vec() {
                        let rebased = Chunk::new_block_header(
                            chunk.sequence_number,
                            chunk.size,
                            descriptor,
                            chunk.position(),
                        );
                        // Cross-mountpoint duplicates are logged, not fatal.
                        if let Err(e) = set.insert(rebased, Path::new(&mountpoint)) {
                            vbs_warn!(1, "{e}");
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    let mut slot = hard_error.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            }
        }));
    }

    // All workers are joined before discovery returns.
    pool.jobs_completed();

    if let Some(e) = hard_error.lock().unwrap().take() {
        return Err(e);
    }

    let (set, files) = Arc::try_unwrap(shared)
        .unwrap_or_else(|_| unreachable!("all workers joined above"))
        .into_inner()
        .unwrap();
    Ok((set, files))
}

/// Scans a single mountpoint's `recording_name` file. Returns `Ok(None)` for
/// every silent-skip case (missing file, not a regular file, unrecognized
/// header); within-file duplicates and corrupt block headers are hard
/// errors.
fn scan_mountpoint(mountpoint: &str, recording_name: &str) -> Result<Option<(OrderedChunkSet, File)>, VbsError> {
    let path = Path::new(mountpoint).join(recording_name);

    match lstat(&path) {
        Ok(st) => {
            if !SFlag::from_bits_truncate(st.st_mode).contains(SFlag::S_IFREG) {
                return Ok(None);
            }
        }
        Err(nix::errno::Errno::ENOENT) => return Ok(None),
        Err(e) => {
            vbs_warn!(1, "lstat {}: {}", path.display(), e);
            return Ok(None);
        }
    }

    let mut file = File::open(&path)?;

    let mut header_buf = [0u8; FILE_HEADER_SIZE];
    if file.read_exact(&mut header_buf).is_err() {
        return Ok(None);
    }
    let Some(header) = FileHeader::parse(&header_buf) else {
        return Ok(None);
    };
    if !header.is_recognized() {
        return Ok(None);
    }

    let mut local_set = OrderedChunkSet::new();
    let mut position: u64 = FILE_HEADER_SIZE as u64;

    loop {
        let mut block_buf = [0u8; BLOCK_HEADER_SIZE];
        match file.read_exact(&mut block_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(VbsError::Io(e)),
        }

        let block = BlockHeader::parse(&block_buf).expect("buffer is exactly BLOCK_HEADER_SIZE");

        if block.block_number < 0 || block.wb_size == 0 || (block.wb_size as usize) < BLOCK_HEADER_SIZE {
            return Err(VbsError::CorruptBlockHeader {
                source: path.clone(),
                detail: "non-positive wb_size or negative block_number",
            });
        }

        let sequence_number = block.block_number as u64;
        let payload_size = block.wb_size as u64 - BLOCK_HEADER_SIZE as u64;
        let payload_position = position + BLOCK_HEADER_SIZE as u64;

        let chunk = Chunk::new_block_header(sequence_number, payload_size, 0, payload_position);
        local_set.insert(chunk, &path)?;

        position += block.wb_size as u64;
        file.seek(SeekFrom::Start(position))?;
    }

    Ok(Some((local_set, file)))
}

/// Closes the given distinct-by-value descriptors exactly once. `File`'s
/// `Drop` already closes the fd; this function exists so the call site
/// reads as an explicit, intentional release rather than relying on an
/// implicit drop at scope end.
pub fn close_descriptors(files: Vec<File>) {
    drop(files);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_block_header_file(path: &Path, blocks: &[(i32, &[u8])]) {
        use std::io::Write;
        let mut f = File::create(path).unwrap();
        let mut header = [0u8; FILE_HEADER_SIZE];
        header[0..8].copy_from_slice(&super::super::format::MARK6_SG_SYNC_WORD.to_le_bytes());
        header[8..12].copy_from_slice(&super::super::format::SUPPORTED_VERSION.to_le_bytes());
        f.write_all(&header).unwrap();

        for (block_number, payload) in blocks {
            let wb_size = (BLOCK_HEADER_SIZE + payload.len()) as u32;
            let mut bh = [0u8; BLOCK_HEADER_SIZE];
            bh[0..4].copy_from_slice(&block_number.to_le_bytes());
            bh[4..8].copy_from_slice(&wb_size.to_le_bytes());
            f.write_all(&bh).unwrap();
            f.write_all(payload).unwrap();
        }
    }

    #[test]
    fn discovers_blocks_in_order() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        std::fs::create_dir_all(&mp).unwrap();
        write_block_header_file(&mp.join("rec_D"), &[(0, b"AAAAAAAA"), (1, b"BBBB")]);

        let (set, files) = discover("rec_D", &[mp.to_str().unwrap().to_string()]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(files.len(), 1);
        let sizes: Vec<u64> = set.iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec![8, 4]);
    }

    #[test]
    fn unrecognized_header_is_skipped_silently() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        std::fs::create_dir_all(&mp).unwrap();
        std::fs::write(mp.join("rec_E"), vec![0u8; 128]).unwrap();

        let (set, files) = discover("rec_E", &[mp.to_str().unwrap().to_string()]).unwrap();
        assert!(set.is_empty());
        assert!(files.is_empty());
    }

    #[test]
    fn corrupt_block_header_is_hard_error() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        std::fs::create_dir_all(&mp).unwrap();
        // wb_size == 0 is corrupt.
        write_block_header_file(&mp.join("rec_F"), &[(0, b"")]);
        // Overwrite wb_size field with 0 directly since the helper always
        // computes a valid size; corrupt it by hand.
        use std::io::{Seek, SeekFrom, Write};
        let mut f = File::options().write(true).open(mp.join("rec_F")).unwrap();
        f.seek(SeekFrom::Start(FILE_HEADER_SIZE as u64 + 4)).unwrap();
        f.write_all(&0u32.to_le_bytes()).unwrap();

        let err = discover("rec_F", &[mp.to_str().unwrap().to_string()]).unwrap_err();
        assert!(matches!(err, VbsError::CorruptBlockHeader { .. }));
    }

    #[test]
    fn duplicate_block_number_within_file_is_hard_error() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        std::fs::create_dir_all(&mp).unwrap();
        write_block_header_file(&mp.join("rec_G"), &[(0, b"AAAA"), (0, b"BBBB")]);

        let err = discover("rec_G", &[mp.to_str().unwrap().to_string()]).unwrap_err();
        assert!(matches!(err, VbsError::DuplicateChunk { .. }));
    }

    #[test]
    fn missing_file_on_one_mountpoint_is_silent() {
        let root = tempdir().unwrap();
        let mp0 = root.path().join("disk0");
        let mp1 = root.path().join("disk1");
        std::fs::create_dir_all(&mp0).unwrap();
        std::fs::create_dir_all(&mp1).unwrap();
        write_block_header_file(&mp0.join("rec_H"), &[(0, b"AAAA")]);

        let (set, files) = discover(
            "rec_H",
            &[mp0.to_str().unwrap().to_string(), mp1.to_str().unwrap().to_string()],
        )
        .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(files.len(), 1);
    }
}
