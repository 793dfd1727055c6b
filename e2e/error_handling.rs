//! End-to-end scenarios for the error taxonomy.

use std::fs;

use tempfile::tempdir;
use vbs::{close, open, open_scattered, read, seek, Layout, VbsError, Whence};

fn write_piece(dir: &std::path::Path, rec: &str, seq: u32, data: &[u8]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{rec}.{seq:08}")), data).unwrap();
}

#[test]
fn duplicate_sequence_number_across_mountpoints_is_rejected() {
    let root = tempdir().unwrap();
    let mp0 = root.path().join("disk0");
    let mp1 = root.path().join("disk1");
    write_piece(&mp0.join("rec_dup"), "rec_dup", 0, b"AAAA");
    write_piece(&mp1.join("rec_dup"), "rec_dup", 0, b"BBBB");

    let err = open_scattered(
        "rec_dup",
        &[mp0.to_str().unwrap().to_string(), mp1.to_str().unwrap().to_string()],
    )
    .unwrap_err();
    assert!(matches!(err, VbsError::DuplicateChunk { sequence_number: 0, .. }));
}

#[test]
fn open_with_no_matching_pieces_is_not_found() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    fs::create_dir_all(&mp).unwrap();

    let err = open_scattered("rec_missing", &[mp.to_str().unwrap().to_string()]).unwrap_err();
    assert!(matches!(err, VbsError::NotFound));
}

#[test]
fn open_with_nonexistent_mountpoint_is_silently_skipped_and_not_found() {
    let root = tempdir().unwrap();
    let present = root.path().join("disk0");
    write_piece(&present.join("rec_X"), "rec_X", 0, b"data");
    let missing = root.path().join("does_not_exist");

    // The recording is only discoverable via the present mountpoint; the
    // missing one must not turn into an error.
    let h = open_scattered(
        "rec_X",
        &[missing.to_str().unwrap().to_string(), present.to_str().unwrap().to_string()],
    )
    .unwrap();
    close(h).unwrap();
}

#[test]
fn empty_recording_name_is_invalid_argument() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    fs::create_dir_all(&mp).unwrap();

    let err = open("", &[mp.to_str().unwrap().to_string()], Layout::Scattered).unwrap_err();
    assert!(matches!(err, VbsError::InvalidArgument(_)));
}

#[test]
fn empty_mountpoint_list_is_invalid_argument() {
    let err = open("rec_A", &[], Layout::Scattered).unwrap_err();
    assert!(matches!(err, VbsError::InvalidArgument(_)));
}

#[test]
fn operations_on_a_closed_handle_are_bad_handle() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    write_piece(&mp.join("rec_Y"), "rec_Y", 0, b"data");

    let h = open_scattered("rec_Y", &[mp.to_str().unwrap().to_string()]).unwrap();
    close(h).unwrap();

    let mut buf = [0u8; 4];
    assert!(matches!(read(h, &mut buf).unwrap_err(), VbsError::BadHandle));
    assert!(matches!(seek(h, 0, Whence::Set).unwrap_err(), VbsError::BadHandle));
    assert!(matches!(close(h).unwrap_err(), VbsError::BadHandle));
}

#[test]
fn unknown_handle_value_is_bad_handle() {
    let mut buf = [0u8; 4];
    assert!(matches!(read(-999_999, &mut buf).unwrap_err(), VbsError::BadHandle));
}
