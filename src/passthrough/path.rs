//! Composition of underlying paths from the virtual paths handed in by the
//! FUSE session. The virtual namespace mirrors the base directory one to one,
//! so composition is plain concatenation: no normalization, no symlink
//! resolution, no existence checks. Whatever the string says is handed to the
//! kernel verbatim; the syscall that follows decides what it means.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Appends a slash-rooted virtual path to the base directory.
///
/// An empty virtual path yields the base directory itself, which is how
/// operations on the mount root reach the underlying root.
pub fn resolve(root: &Path, path: &OsStr) -> PathBuf {
    let mut joined = root.as_os_str().to_os_string();
    joined.push(path);
    PathBuf::from(joined)
}

/// Composes the virtual path of `name` inside the virtual directory `parent`,
/// the same way the session layer spells paths ("/" parent does not double the
/// separator).
pub fn child(parent: &OsStr, name: &OsStr) -> OsString {
    let mut path = parent.to_os_string();
    if !parent.as_bytes().ends_with(b"/") {
        path.push("/");
    }
    path.push(name);
    path
}
