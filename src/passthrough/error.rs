//! Translation of native failure signals into the errno vocabulary the FUSE
//! session reports to the kernel.
//!
//! Every syscall wrapper used by this crate captures the failing errno at the
//! call site (`nix` results, or `io::Error::last_os_error()` immediately after
//! a raw libc call), so the value can never be clobbered by an intervening
//! call. Translation is total: a failure that carries no OS code still comes
//! back as EIO instead of disappearing.

use rfuse3::Errno;
use std::io;

/// Maps a nix-level errno to the session errno, 1:1.
pub(crate) fn from_nix(err: nix::errno::Errno) -> Errno {
    Errno::from(err as i32)
}

/// Maps an io::Error to the session errno. Errors synthesized without an OS
/// code (in-memory failures, invalid argument shapes) degrade to EIO.
pub(crate) fn from_io(err: io::Error) -> Errno {
    match err.raw_os_error() {
        Some(code) => Errno::from(code),
        None => Errno::from(libc::EIO),
    }
}
