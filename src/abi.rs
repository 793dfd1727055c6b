//! C-ABI surface over [`crate::io_engine`].
//!
//! Each extern function validates its pointers, delegates to the safe API,
//! and translates the result into a C-friendly return value plus `errno`.
//! Not published as a stable ABI deliverable — exercised only by `vbsutil`
//! and by this core's own tests.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

use crate::discovery::Layout;
use crate::error::VbsError;
use crate::io_engine::{self, Whence};

fn set_errno(err: &VbsError) {
    unsafe {
        *libc::__errno_location() = err.to_errno();
    }
}

/// Reads a NUL-terminated `const char* const*` array of `count` mountpoint
/// strings. Returns `None` if the array pointer or any element is null.
unsafe fn read_mountpoints(mountpoints: *const *const c_char, count: c_int) -> Option<Vec<String>> {
    if mountpoints.is_null() || count < 0 {
        return None;
    }
    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count as isize {
        let ptr = *mountpoints.offset(i);
        if ptr.is_null() {
            return None;
        }
        out.push(CStr::from_ptr(ptr).to_string_lossy().into_owned());
    }
    Some(out)
}

unsafe fn open_common(
    recording_name: *const c_char,
    mountpoints: *const *const c_char,
    count: c_int,
    layout: Layout,
) -> i64 {
    if recording_name.is_null() {
        set_errno(&VbsError::InvalidArgument("recording name is null"));
        return -1;
    }
    let name = CStr::from_ptr(recording_name).to_string_lossy().into_owned();
    let Some(mps) = read_mountpoints(mountpoints, count) else {
        set_errno(&VbsError::InvalidArgument("mountpoint list is null"));
        return -1;
    };
    match io_engine::open(&name, &mps, layout) {
        Ok(handle) => handle,
        Err(e) => {
            set_errno(&e);
            -1
        }
    }
}

/// `vbs_open_scattered(recording_name, mountpoints, count) -> handle | -1`.
#[no_mangle]
pub unsafe extern "C" fn vbs_open_scattered(
    recording_name: *const c_char,
    mountpoints: *const *const c_char,
    count: c_int,
) -> i64 {
    open_common(recording_name, mountpoints, count, Layout::Scattered)
}

/// `vbs_open_block_header(recording_name, mountpoints, count) -> handle | -1`.
#[no_mangle]
pub unsafe extern "C" fn vbs_open_block_header(
    recording_name: *const c_char,
    mountpoints: *const *const c_char,
    count: c_int,
) -> i64 {
    open_common(recording_name, mountpoints, count, Layout::BlockHeader)
}

/// `vbs_read(handle, buffer, count) -> bytes_read | -1`.
#[no_mangle]
pub unsafe extern "C" fn vbs_read(handle: i64, buffer: *mut c_void, count: usize) -> isize {
    if buffer.is_null() {
        set_errno(&VbsError::BadAddress);
        return -1;
    }
    if count == 0 {
        return 0;
    }
    let buf = std::slice::from_raw_parts_mut(buffer as *mut u8, count);
    match io_engine::read(handle, buf) {
        Ok(n) => n as isize,
        Err(e) => {
            set_errno(&e);
            -1
        }
    }
}

/// `vbs_seek(handle, offset, whence) -> position | -1`.
/// `whence` accepts the POSIX `SEEK_SET` / `SEEK_CUR` / `SEEK_END` values.
#[no_mangle]
pub extern "C" fn vbs_seek(handle: i64, offset: i64, whence: c_int) -> i64 {
    let w = if whence == libc::SEEK_SET {
        Whence::Set
    } else if whence == libc::SEEK_CUR {
        Whence::Cur
    } else if whence == libc::SEEK_END {
        Whence::End
    } else {
        set_errno(&VbsError::InvalidArgument("unrecognized whence value"));
        return -1;
    };

    match io_engine::seek(handle, offset, w) {
        Ok(pos) => pos as i64,
        Err(e) => {
            set_errno(&e);
            -1
        }
    }
}

/// `vbs_close(handle) -> 0 | -1`.
#[no_mangle]
pub extern "C" fn vbs_close(handle: i64) -> c_int {
    match io_engine::close(handle) {
        Ok(()) => 0,
        Err(e) => {
            set_errno(&e);
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn open_read_seek_close_round_trip_through_abi() {
        let dir = tempdir().unwrap();
        let mp = dir.path().join("disk0");
        let rec_dir = mp.join("rec_abi");
        fs::create_dir_all(&rec_dir).unwrap();
        fs::write(rec_dir.join("rec_abi.00000000"), b"HELLOWORLD").unwrap();

        let name = CString::new("rec_abi").unwrap();
        let mp_c = CString::new(mp.to_str().unwrap()).unwrap();
        let mp_ptrs = [mp_c.as_ptr()];

        let handle = unsafe { vbs_open_scattered(name.as_ptr(), mp_ptrs.as_ptr(), 1) };
        assert!(handle < 0, "expected a negative handle value, got {handle}");

        let mut buf = [0u8; 10];
        let n = unsafe { vbs_read(handle, buf.as_mut_ptr() as *mut c_void, buf.len()) };
        assert_eq!(n, 10);
        assert_eq!(&buf, b"HELLOWORLD");

        let pos = vbs_seek(handle, 0, libc::SEEK_SET);
        assert_eq!(pos, 0);

        assert_eq!(vbs_close(handle), 0);
        assert_eq!(vbs_close(handle), -1);
        assert_eq!(unsafe { *libc::__errno_location() }, libc::EBADF);
    }

    #[test]
    fn null_buffer_is_bad_address() {
        let n = unsafe { vbs_read(-1, std::ptr::null_mut(), 4) };
        assert_eq!(n, -1);
        assert_eq!(unsafe { *libc::__errno_location() }, libc::EFAULT);
    }

    #[test]
    fn null_recording_name_is_invalid_argument() {
        let mp_c = CString::new("/tmp").unwrap();
        let mp_ptrs = [mp_c.as_ptr()];
        let handle = unsafe { vbs_open_scattered(std::ptr::null(), mp_ptrs.as_ptr(), 1) };
        assert_eq!(handle, -1);
        assert_eq!(unsafe { *libc::__errno_location() }, libc::EINVAL);
    }
}
