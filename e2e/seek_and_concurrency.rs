//! End-to-end scenarios for seek semantics and cross-handle concurrency.

use std::fs;
use std::thread;

use tempfile::tempdir;
use vbs::{close, open_scattered, read, seek, VbsError, Whence};

fn write_piece(dir: &std::path::Path, rec: &str, seq: u32, data: &[u8]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{rec}.{seq:08}")), data).unwrap();
}

#[test]
fn seek_past_end_then_read_returns_zero_then_rewind_reads_everything() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    let rec_dir = mp.join("rec_S");
    write_piece(&rec_dir, "rec_S", 0, b"0123456789");

    let h = open_scattered("rec_S", &[mp.to_str().unwrap().to_string()]).unwrap();
    let size = seek(h, 0, Whence::End).unwrap();
    assert_eq!(size, 10);

    let pos = seek(h, 100, Whence::Set).unwrap();
    assert_eq!(pos, size + 100);

    let mut buf = [0u8; 10];
    assert_eq!(read(h, &mut buf).unwrap(), 0);

    let pos = seek(h, 0, Whence::Set).unwrap();
    assert_eq!(pos, 0);
    let n = read(h, &mut buf).unwrap();
    assert_eq!(n, 10);
    assert_eq!(&buf, b"0123456789");

    close(h).unwrap();
}

#[test]
fn seek_whence_cur_and_end_are_relative_to_the_right_origin() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    let rec_dir = mp.join("rec_T");
    write_piece(&rec_dir, "rec_T", 0, b"ABCDEFGHIJ");

    let h = open_scattered("rec_T", &[mp.to_str().unwrap().to_string()]).unwrap();

    seek(h, 3, Whence::Set).unwrap();
    let pos = seek(h, 2, Whence::Cur).unwrap();
    assert_eq!(pos, 5);

    let pos = seek(h, -2, Whence::End).unwrap();
    assert_eq!(pos, 8);

    close(h).unwrap();
}

#[test]
fn seek_negative_whence_set_is_invalid_argument() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");
    let rec_dir = mp.join("rec_U");
    write_piece(&rec_dir, "rec_U", 0, b"data");

    let h = open_scattered("rec_U", &[mp.to_str().unwrap().to_string()]).unwrap();
    let err = seek(h, -1, Whence::Set).unwrap_err();
    assert!(matches!(err, VbsError::InvalidArgument(_)));
    close(h).unwrap();
}

#[test]
fn concurrent_handles_read_independently_in_parallel_threads() {
    let root = tempdir().unwrap();
    let mp = root.path().join("disk0");

    let recordings = ["rec_p0", "rec_p1", "rec_p2", "rec_p3"];
    for (i, rec) in recordings.iter().enumerate() {
        let payload = vec![b'a' + i as u8; 20];
        write_piece(&mp.join(rec), rec, 0, &payload);
    }

    let mountpoint = mp.to_str().unwrap().to_string();
    let handles: Vec<i64> = recordings
        .iter()
        .map(|rec| open_scattered(rec, &[mountpoint.clone()]).unwrap())
        .collect();

    let joins: Vec<_> = handles
        .iter()
        .copied()
        .enumerate()
        .map(|(i, h)| {
            thread::spawn(move || {
                let mut buf = [0u8; 20];
                let n = read(h, &mut buf).unwrap();
                assert_eq!(n, 20);
                assert!(buf.iter().all(|&b| b == b'a' + i as u8));
            })
        })
        .collect();

    for j in joins {
        j.join().unwrap();
    }

    for h in handles {
        close(h).unwrap();
    }
}
