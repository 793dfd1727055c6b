//! End-to-end scenarios for the block-header layout.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tempfile::tempdir;
use vbs::discovery::format::{BLOCK_HEADER_SIZE, FILE_HEADER_SIZE, MARK6_SG_SYNC_WORD, SUPPORTED_VERSION};
use vbs::{close, open_block_header, read, seek, VbsError, Whence};

fn write_block_header_file(path: &Path, blocks: &[(i32, &[u8])]) {
    let mut f = File::create(path).unwrap();
    let mut header = [0u8; FILE_HEADER_SIZE];
    header[0..8].copy_from_slice(&MARK6_SG_SYNC_WORD.to_le_bytes());
    header[8..12].copy_from_slice(&SUPPORTED_VERSION.to_le_bytes());
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
fn two_blocks_concatenate_in_block_number_order() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    std::fs::create_dir_all(&mp).unwrap();
    write_block_header_file(&mp.join("rec_D"), &[(0, b"AAAAAAAA"), (1, b"BBBB")]);

    let h = open_block_header("rec_D", &[mp.to_str().unwrap().to_string()]).unwrap();
    let size = seek(h, 0, Whence::End).unwrap();
    assert_eq!(size, 12);

    seek(h, 0, Whence::Set).unwrap();
    let mut buf = [0u8; 12];
    assert_eq!(read(h, &mut buf).unwrap(), 12);
    assert_eq!(&buf, b"AAAAAAAABBBB");

    close(h).unwrap();
}

#[test]
fn file_with_wrong_sync_word_is_skipped_and_recording_is_not_found() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    std::fs::create_dir_all(&mp).unwrap();
    std::fs::write(mp.join("rec_unrecognized"), vec![0xAAu8; 128]).unwrap();

    let err = open_block_header("rec_unrecognized", &[mp.to_str().unwrap().to_string()]).unwrap_err();
    assert!(matches!(err, VbsError::NotFound));
}

#[test]
fn corrupt_wb_size_fails_open_with_corrupt_block_header() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    std::fs::create_dir_all(&mp).unwrap();
    let path = mp.join("rec_corrupt");
    write_block_header_file(&path, &[(0, b"AAAA")]);

    // Hand-corrupt wb_size to 0 for the one block.
    use std::io::{Seek, SeekFrom};
    let mut f = File::options().write(true).open(&path).unwrap();
    f.seek(SeekFrom::Start(FILE_HEADER_SIZE as u64 + 4)).unwrap();
    f.write_all(&0u32.to_le_bytes()).unwrap();

    let err = open_block_header("rec_corrupt", &[mp.to_str().unwrap().to_string()]).unwrap_err();
    assert!(matches!(err, VbsError::CorruptBlockHeader { .. }));
}

#[test]
fn multiple_mountpoints_merge_distinct_block_ranges() {
    let root = tempdir().unwrap();
    let mp0 = root.path().join("disk0");
    let mp1 = root.path().join("disk1");
    std::fs::create_dir_all(&mp0).unwrap();
    std::fs::create_dir_all(&mp1).unwrap();
    write_block_header_file(&mp0.join("rec_multi"), &[(0, b"AAAA")]);
    write_block_header_file(&mp1.join("rec_multi"), &[(1, b"BBBB")]);

    let h = open_block_header(
        "rec_multi",
        &[mp0.to_str().unwrap().to_string(), mp1.to_str().unwrap().to_string()],
    )
    .unwrap();
    let size = seek(h, 0, Whence::End).unwrap();
    assert_eq!(size, 8);
    close(h).unwrap();
}
