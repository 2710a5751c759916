//! Thin wrappers over the non-following extended-attribute syscalls.
//!
//! The `l*` family is used throughout so an attribute operation on a symlink
//! touches the link itself, never its target. Each wrapper reads the errno
//! right after the failing call and returns it as an io::Error.

use std::ffi::CStr;
use std::io;

/// Reads the attribute value into `buf`. An empty `buf` is the size probe:
/// the kernel reports the number of bytes the value occupies without copying
/// anything out.
pub(crate) fn lgetxattr(path: &CStr, name: &CStr, buf: &mut [u8]) -> io::Result<usize> {
    let res = unsafe {
        libc::lgetxattr(
            path.as_ptr(),
            name.as_ptr(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(res as usize)
}

pub(crate) fn lsetxattr(path: &CStr, name: &CStr, value: &[u8], flags: i32) -> io::Result<()> {
    let res = unsafe {
        libc::lsetxattr(
            path.as_ptr(),
            name.as_ptr(),
            value.as_ptr() as *const libc::c_void,
            value.len(),
            flags as libc::c_int,
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Fills `buf` with the NUL-separated attribute name list; empty `buf` probes
/// the required size, same convention as [`lgetxattr`].
pub(crate) fn llistxattr(path: &CStr, buf: &mut [u8]) -> io::Result<usize> {
    let res = unsafe {
        libc::llistxattr(
            path.as_ptr(),
            buf.as_mut_ptr() as *mut libc::c_char,
            buf.len(),
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(res as usize)
}

pub(crate) fn lremovexattr(path: &CStr, name: &CStr) -> io::Result<()> {
    let res = unsafe { libc::lremovexattr(path.as_ptr(), name.as_ptr()) };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
