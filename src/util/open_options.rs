use bitflags::bitflags;

// Flags used by the OPEN/CREATE reply.
/// Bypass page cache for this open file.
const FOPEN_DIRECT_IO: u32 = 1;

/// Don't invalidate the data cache on open.
const FOPEN_KEEP_CACHE: u32 = 2;

/// The file is not seekable.
const FOPEN_NONSEEKABLE: u32 = 4;

/// allow caching this directory
const FOPEN_CACHE_DIR: u32 = 8;

bitflags! {
    /// Options returned to the kernel in response to an open or create
    /// request, controlling how it treats the resulting file handle.
    pub struct OpenOptions: u32 {
        /// Bypass page cache for this open file.
        const DIRECT_IO = FOPEN_DIRECT_IO;
        /// Don't invalidate the data cache on open.
        const KEEP_CACHE = FOPEN_KEEP_CACHE;
        /// The file is not seekable.
        const NONSEEKABLE = FOPEN_NONSEEKABLE;
        /// allow caching this directory
        const CACHE_DIR = FOPEN_CACHE_DIR;
    }
}

/// Reply options derived from the flag word of the open request. A client
/// that asked for O_DIRECT gets DIRECT_IO back, so the kernel keeps its page
/// cache out of the data path; everything else passes through unmodified.
pub(crate) fn reply_flags_for(flags: u32) -> u32 {
    let mut options = OpenOptions::empty();
    if flags as i32 & libc::O_DIRECT != 0 {
        options |= OpenOptions::DIRECT_IO;
    }
    options.bits()
}
