//! End-to-end scenarios for the scattered-file layout.

use std::fs;

use tempfile::tempdir;
use vbs::{close, open_scattered, read, seek, Whence};

fn write_piece(dir: &std::path::Path, rec: &str, seq: u32, data: &[u8]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{rec}.{seq:08}")), data).unwrap();
}

#[test]
fn single_mountpoint_two_pieces_concatenate_in_order() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    let rec_dir = mp.join("rec_A");
    write_piece(&rec_dir, "rec_A", 0, b"ABCDEFGHIJ");
    write_piece(&rec_dir, "rec_A", 1, b"KLMNO");

    let h = open_scattered("rec_A", &[mp.to_str().unwrap().to_string()]).unwrap();
    let size = seek(h, 0, Whence::End).unwrap();
    assert_eq!(size, 15);

    seek(h, 0, Whence::Set).unwrap();
    let mut buf = [0u8; 15];
    let n = read(h, &mut buf).unwrap();
    assert_eq!(n, 15);
    assert_eq!(&buf, b"ABCDEFGHIJKLMNO");

    close(h).unwrap();
}

#[test]
fn sparse_sequence_numbers_are_logically_contiguous() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    let rec_dir = mp.join("rec_B");
    write_piece(&rec_dir, "rec_B", 0, b"1111");
    write_piece(&rec_dir, "rec_B", 5, b"2222");

    let h = open_scattered("rec_B", &[mp.to_str().unwrap().to_string()]).unwrap();
    let size = seek(h, 0, Whence::End).unwrap();
    assert_eq!(size, 8);

    seek(h, 0, Whence::Set).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(read(h, &mut buf).unwrap(), 8);
    assert_eq!(&buf, b"11112222");

    seek(h, 4, Whence::Set).unwrap();
    let mut tail = [0u8; 4];
    assert_eq!(read(h, &mut tail).unwrap(), 4);
    assert_eq!(&tail, b"2222");

    close(h).unwrap();
}

#[test]
fn recording_name_with_regex_metacharacters_matches_literally() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    let rec_dir = mp.join("foo.bar+baz");
    write_piece(&rec_dir, "foo.bar+baz", 0, b"real");
    // Decoy with the metacharacters stripped out; must not be mistaken for a match.
    fs::write(rec_dir.join("fooXbarYbazX00000000"), b"decoy").unwrap();

    let h = open_scattered("foo.bar+baz", &[mp.to_str().unwrap().to_string()]).unwrap();
    let size = seek(h, 0, Whence::End).unwrap();
    assert_eq!(size, 4);

    seek(h, 0, Whence::Set).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(read(h, &mut buf).unwrap(), 4);
    assert_eq!(&buf, b"real");

    close(h).unwrap();
}

#[test]
fn partial_reads_accumulate_to_the_full_stream() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    let rec_dir = mp.join("rec_partial");
    write_piece(&rec_dir, "rec_partial", 0, b"ABCDEFGHIJ");
    write_piece(&rec_dir, "rec_partial", 1, b"KLMNO");

    let h = open_scattered("rec_partial", &[mp.to_str().unwrap().to_string()]).unwrap();
    let mut collected = Vec::new();
    let mut buf = [0u8; 3];
    loop {
        let n = read(h, &mut buf).unwrap();
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&buf[..n]);
    }
    assert_eq!(collected, b"ABCDEFGHIJKLMNO");

    close(h).unwrap();
}
