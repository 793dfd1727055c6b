//! Scattered-file discovery strategy.
//!
//! One independent subdirectory per mountpoint; mountpoints are processed
//! sequentially since each is already an independent unit of work with no
//! shared state to contend over (unlike the block-header strategy, which
//! parallelizes because each mountpoint contributes only one file and the
//! per-file header parse dominates).

use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use nix::sys::stat::lstat;

use crate::chunk::{Chunk, OrderedChunkSet};
use crate::error::VbsError;
use crate::path_utils::parse_sequence_suffix;
use crate::vbs_warn;

/// Runs the scattered-file strategy across `mountpoints` for `recording_name`.
pub fn discover(recording_name: &str, mountpoints: &[String]) -> Result<OrderedChunkSet, VbsError> {
    let mut set = OrderedChunkSet::new();

    for mountpoint in mountpoints {
        let rec_dir = Path::new(mountpoint).join(recording_name);

        match lstat(&rec_dir) {
            Ok(st) => {
                if !nix::sys::stat::SFlag::from_bits_truncate(st.st_mode).contains(nix::sys::stat::SFlag::S_IFDIR) {
                    continue;
                }
            }
            Err(nix::errno::Errno::ENOENT) => continue,
            Err(e) => {
                vbs_warn!(1, "lstat {}: {}", rec_dir.display(), e);
                continue;
            }
        }

        if let Err(e) = scan_recording_dir(&rec_dir, recording_name, &mut set) {
            match e {
                VbsError::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound => continue,
                VbsError::DuplicateChunk { .. } => return Err(e),
                VbsError::Io(ref io_err) => {
                    vbs_warn!(1, "reading {}: {}", rec_dir.display(), io_err);
                }
                _ => return Err(e),
            }
        }
    }

    Ok(set)
}

fn scan_recording_dir(
    rec_dir: &Path,
    recording_name: &str,
    set: &mut OrderedChunkSet,
) -> Result<(), VbsError> {
    let entries = fs::read_dir(rec_dir)?;

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        let Some(suffix) = name.strip_prefix(recording_name) else { continue };
        let Some(digits) = suffix.strip_prefix('.') else { continue };
        let Some(sequence_number) = parse_sequence_suffix(digits) else { continue };

        let path: PathBuf = entry.path();
        let size = file_size(&path)?;
        let chunk = Chunk::new_scattered(sequence_number, size, path);
        set.insert(chunk, rec_dir)?;
    }

    Ok(())
}

/// Opens, seeks to end, and closes `path` to obtain its size.
fn file_size(path: &Path) -> Result<u64, VbsError> {
    let mut f = File::open(path)?;
    let size = f.seek(SeekFrom::End(0))?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_piece(dir: &Path, rec: &str, seq: u32, data: &[u8]) {
        fs::write(dir.join(format!("{rec}.{seq:08}")), data).unwrap();
    }

    #[test]
    fn discovers_and_orders_chunks() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        let rec_dir = mp.join("rec_A");
        fs::create_dir_all(&rec_dir).unwrap();
        write_piece(&rec_dir, "rec_A", 0, b"ABCDEFGHIJ");
        write_piece(&rec_dir, "rec_A", 1, b"KLMNO");

        let set = discover("rec_A", &[mp.to_str().unwrap().to_string()]).unwrap();
        assert_eq!(set.len(), 2);
        let sizes: Vec<u64> = set.iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec![10, 5]);
    }

    #[test]
    fn missing_mountpoint_subdir_is_silent() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        fs::create_dir_all(&mp).unwrap();
        let set = discover("rec_missing", &[mp.to_str().unwrap().to_string()]).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn decoy_file_with_metacharacter_name_is_ignored() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        let rec_dir = mp.join("foo.bar+baz");
        fs::create_dir_all(&rec_dir).unwrap();
        write_piece(&rec_dir, "foo.bar+baz", 0, b"real");
        fs::write(rec_dir.join("fooXbarYbazX00000000"), b"decoy").unwrap();

        let set = discover("foo.bar+baz", &[mp.to_str().unwrap().to_string()]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_sequence_number_across_mountpoints_is_hard_error() {
        let root = tempdir().unwrap();
        let mp1 = root.path().join("disk0");
        let mp2 = root.path().join("disk1");
        fs::create_dir_all(mp1.join("rec_C")).unwrap();
        fs::create_dir_all(mp2.join("rec_C")).unwrap();
        write_piece(&mp1.join("rec_C"), "rec_C", 0, b"aaaa");
        write_piece(&mp2.join("rec_C"), "rec_C", 0, b"bbbb");

        let err = discover(
            "rec_C",
            &[mp1.to_str().unwrap().to_string(), mp2.to_str().unwrap().to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, VbsError::DuplicateChunk { sequence_number: 0, .. }));
    }

    #[test]
    fn sparse_sequence_numbers_are_allowed() {
        let root = tempdir().unwrap();
        let mp = root.path().join("disk0");
        let rec_dir = mp.join("rec_B");
        fs::create_dir_all(&rec_dir).unwrap();
        write_piece(&rec_dir, "rec_B", 0, b"1111");
        write_piece(&rec_dir, "rec_B", 5, b"2222");

        let set = discover("rec_B", &[mp.to_str().unwrap().to_string()]).unwrap();
        let seqs: Vec<u64> = set.iter().map(|c| c.sequence_number).collect();
        assert_eq!(seqs, vec![0, 5]);
    }
}
