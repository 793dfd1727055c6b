//! The I/O engine: `open` / `read` / `seek` / `close` entry points built on
//! discovery, the virtual file, and the handle table.

use crate::discovery::{block_header, scattered, Layout};
use crate::error::{VbsError, VbsResult};
use crate::handle_table::table;
use crate::vfile::VirtualFile;

pub use crate::vfile::Whence;

/// An opaque handle returned by `open`, accepted by `read`/`seek`/`close`.
pub type Handle = i64;

fn validate_open_args(recording_name: &str, mountpoints: &[String]) -> VbsResult<()> {
    if recording_name.is_empty() {
        return Err(VbsError::InvalidArgument("recording name must not be empty"));
    }
    if mountpoints.is_empty() {
        return Err(VbsError::InvalidArgument("mountpoint list must not be empty"));
    }
    Ok(())
}

/// Opens `recording_name` across `mountpoints`, assuming the scattered-file
/// on-disk layout.
pub fn open_scattered(recording_name: &str, mountpoints: &[String]) -> VbsResult<Handle> {
    validate_open_args(recording_name, mountpoints)?;
    let set = scattered::discover(recording_name, mountpoints)?;
    if set.is_empty() {
        return Err(VbsError::NotFound);
    }
    let vfile = VirtualFile::new(set, Vec::new())?;
    Ok(table().write().unwrap().insert(vfile))
}

/// Opens `recording_name` across `mountpoints`, assuming the block-header
/// on-disk layout.
pub fn open_block_header(recording_name: &str, mountpoints: &[String]) -> VbsResult<Handle> {
    validate_open_args(recording_name, mountpoints)?;
    let (set, files) = block_header::discover(recording_name, mountpoints)?;
    if set.is_empty() {
        return Err(VbsError::NotFound);
    }
    let vfile = VirtualFile::new(set, files)?;
    Ok(table().write().unwrap().insert(vfile))
}

/// Dispatches to [`open_scattered`] or [`open_block_header`] based on
/// `layout`.
pub fn open(recording_name: &str, mountpoints: &[String], layout: Layout) -> VbsResult<Handle> {
    match layout {
        Layout::Scattered => open_scattered(recording_name, mountpoints),
        Layout::BlockHeader => open_block_header(recording_name, mountpoints),
    }
}

/// Reads up to `buf.len()` bytes at `handle`'s current position, advancing
/// it. Takes the handle table's read lock for the
/// duration of the lookup only.
pub fn read(handle: Handle, buf: &mut [u8]) -> VbsResult<usize> {
    let entry = table().read().unwrap().get(handle).ok_or(VbsError::BadHandle)?;
    entry.lock().unwrap().read(buf)
}

/// Repositions `handle`'s cursor per `(whence, offset)` and returns the new
/// position.
pub fn seek(handle: Handle, offset: i64, whence: Whence) -> VbsResult<u64> {
    let entry = table().read().unwrap().get(handle).ok_or(VbsError::BadHandle)?;
    entry.lock().unwrap().seek(offset, whence)
}

/// Closes `handle`, releasing every descriptor it owns.
pub fn close(handle: Handle) -> VbsResult<()> {
    table()
        .write()
        .unwrap()
        .remove(handle)
        .map(|_| ())
        .ok_or(VbsError::BadHandle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn open_read_seek_close_round_trip() {
        let dir = tempdir().unwrap();
        let mp = dir.path().join("disk0");
        let rec_dir = mp.join("rec_io");
        fs::create_dir_all(&rec_dir).unwrap();
        fs::write(rec_dir.join("rec_io.00000000"), b"ABCDEFGHIJ").unwrap();
        fs::write(rec_dir.join("rec_io.00000001"), b"KLMNO").unwrap();

        let h = open_scattered("rec_io", &[mp.to_str().unwrap().to_string()]).unwrap();
        let size = seek(h, 0, Whence::End).unwrap();
        assert_eq!(size, 15);
        seek(h, 0, Whence::Set).unwrap();

        let mut buf = [0u8; 15];
        let n = read(h, &mut buf).unwrap();
        assert_eq!(n, 15);
        assert_eq!(&buf, b"ABCDEFGHIJKLMNO");

        close(h).unwrap();
        let err = seek(h, 0, Whence::Set).unwrap_err();
        assert!(matches!(err, VbsError::BadHandle));
    }

    #[test]
    fn open_empty_recording_is_not_found() {
        let dir = tempdir().unwrap();
        let mp = dir.path().join("disk0");
        fs::create_dir_all(&mp).unwrap();
        let err = open_scattered("missing", &[mp.to_str().unwrap().to_string()]).unwrap_err();
        assert!(matches!(err, VbsError::NotFound));
    }

    #[test]
    fn open_rejects_empty_recording_name() {
        let err = open_scattered("", &["/tmp".to_string()]).unwrap_err();
        assert!(matches!(err, VbsError::InvalidArgument(_)));
    }

    #[test]
    fn open_rejects_empty_mountpoint_list() {
        let err = open_scattered("rec", &[]).unwrap_err();
        assert!(matches!(err, VbsError::InvalidArgument(_)));
    }

    #[test]
    fn close_unknown_handle_is_bad_handle() {
        let err = close(-999_999_999).unwrap_err();
        assert!(matches!(err, VbsError::BadHandle));
    }

    #[test]
    fn concurrent_reads_on_different_handles() {
        let dir = tempdir().unwrap();
        let mp = dir.path().join("disk0");
        let rec_a = mp.join("rec_x");
        let rec_b = mp.join("rec_y");
        fs::create_dir_all(&rec_a).unwrap();
        fs::create_dir_all(&rec_b).unwrap();
        fs::write(rec_a.join("rec_x.00000000"), b"aaaaaaaaaa").unwrap();
        fs::write(rec_b.join("rec_y.00000000"), b"bbbbbbbbbb").unwrap();

        let mps = vec![mp.to_str().unwrap().to_string()];
        let ha = open_scattered("rec_x", &mps).unwrap();
        let hb = open_scattered("rec_y", &mps).unwrap();

        let t1 = std::thread::spawn(move || {
            let mut buf = [0u8; 10];
            read(ha, &mut buf).unwrap();
            buf
        });
        let t2 = std::thread::spawn(move || {
            let mut buf = [0u8; 10];
            read(hb, &mut buf).unwrap();
            buf
        });

        assert_eq!(&t1.join().unwrap(), b"aaaaaaaaaa");
        assert_eq!(&t2.join().unwrap(), b"bbbbbbbbbb");

        close(ha).unwrap();
        close(hb).unwrap();
    }
}
