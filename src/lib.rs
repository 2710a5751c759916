#[macro_use]
extern crate log;

pub mod passthrough;
pub mod server;
mod util;

// Test utilities (only compiled during tests)
#[cfg(test)]
pub mod test_utils {
    /// Macro: unwrap result or skip test when the backing filesystem does not
    /// support the operation (EOPNOTSUPP/ENOSYS, e.g. xattrs on some tmpfs).
    ///
    /// Behavior:
    /// - On Ok(v): returns v
    /// - On Err(e) where e -> io::Error has raw_os_error()==EOPNOTSUPP or ENOSYS:
    ///     prints a line indicating skip and `return`s from the test.
    /// - On any other Err(e) -> panic with diagnostic.
    ///
    /// Usage example:
    /// let reply = unwrap_or_skip_unsupported!(fs.setxattr(...).await, "setxattr");
    #[macro_export]
    macro_rules! unwrap_or_skip_unsupported {
        ($expr:expr, $ctx:expr) => {{
            match $expr {
                Ok(v) => v,
                Err(e) => {
                    let ioerr: std::io::Error = e.into();
                    let unsupported = ioerr.raw_os_error() == Some(libc::EOPNOTSUPP)
                        || ioerr.raw_os_error() == Some(libc::ENOSYS);
                    if unsupported {
                        eprintln!("skip (unsupported) {}: {:?}", $ctx, ioerr);
                        return;
                    }
                    panic!("{} unexpected error: {:?}", $ctx, ioerr);
                }
            }
        }};
    }
}
