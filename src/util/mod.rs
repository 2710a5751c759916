pub(crate) mod open_options;

use nix::sys::stat::FileStat;
use rfuse3::path::reply::FileAttr;
use rfuse3::{FileType, Timestamp};
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;

pub(crate) fn file_type_from_mode(mode: libc::mode_t) -> FileType {
    match mode & libc::S_IFMT {
        libc::S_IFDIR => FileType::Directory,
        libc::S_IFLNK => FileType::Symlink,
        libc::S_IFCHR => FileType::CharDevice,
        libc::S_IFBLK => FileType::BlockDevice,
        libc::S_IFIFO => FileType::NamedPipe,
        libc::S_IFSOCK => FileType::Socket,
        _ => FileType::RegularFile,
    }
}

pub(crate) fn file_attr_from_stat(st: &FileStat) -> FileAttr {
    FileAttr {
        size: st.st_size as u64,
        blocks: st.st_blocks as u64,
        atime: Timestamp::new(st.st_atime, st.st_atime_nsec as u32),
        mtime: Timestamp::new(st.st_mtime, st.st_mtime_nsec as u32),
        ctime: Timestamp::new(st.st_ctime, st.st_ctime_nsec as u32),
        kind: file_type_from_mode(st.st_mode),
        perm: (st.st_mode & 0o7777) as u16,
        nlink: st.st_nlink as u32,
        uid: st.st_uid,
        gid: st.st_gid,
        rdev: st.st_rdev as u32,
        blksize: st.st_blksize as u32,
    }
}

/// Builds std open options equivalent to the flag word the kernel sends with
/// open/create. The access mode and the flags std models explicitly are
/// translated; everything else rides along via custom_flags. O_CREAT is
/// stripped because creation is decided by the caller, not the flag word.
pub(crate) fn open_options_from_flags(flags: u32) -> OpenOptions {
    let flags = flags as i32;
    let mut options = OpenOptions::new();
    match flags & libc::O_ACCMODE {
        libc::O_WRONLY => {
            options.write(true);
        }
        libc::O_RDWR => {
            options.read(true).write(true);
        }
        _ => {
            options.read(true);
        }
    }
    if flags & libc::O_APPEND != 0 {
        options.append(true);
    }
    if flags & libc::O_TRUNC != 0 {
        options.truncate(true);
    }
    options.custom_flags(flags & !(libc::O_ACCMODE | libc::O_APPEND | libc::O_TRUNC | libc::O_CREAT));
    options
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_type_from_mode_covers_all_kinds() {
        assert_eq!(
            file_type_from_mode(libc::S_IFREG | 0o644),
            FileType::RegularFile
        );
        assert_eq!(
            file_type_from_mode(libc::S_IFDIR | 0o755),
            FileType::Directory
        );
        assert_eq!(file_type_from_mode(libc::S_IFLNK | 0o777), FileType::Symlink);
        assert_eq!(
            file_type_from_mode(libc::S_IFIFO | 0o600),
            FileType::NamedPipe
        );
        assert_eq!(
            file_type_from_mode(libc::S_IFCHR | 0o600),
            FileType::CharDevice
        );
        assert_eq!(
            file_type_from_mode(libc::S_IFBLK | 0o600),
            FileType::BlockDevice
        );
        assert_eq!(file_type_from_mode(libc::S_IFSOCK | 0o600), FileType::Socket);
    }

    #[test]
    fn test_attr_masks_type_bits_out_of_perm() {
        let mut st: FileStat = unsafe { std::mem::zeroed() };
        st.st_mode = libc::S_IFREG | 0o4755;
        st.st_size = 10;
        st.st_nlink = 1;
        let attr = file_attr_from_stat(&st);
        assert_eq!(attr.perm, 0o4755);
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.size, 10);
    }

    #[test]
    fn test_open_options_write_only_flags_open_a_writable_file() {
        let dir = std::env::temp_dir().join("redirectfs_util_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("f");
        std::fs::write(&path, b"x").unwrap();

        use std::io::Write;
        let mut file = open_options_from_flags(libc::O_WRONLY as u32)
            .open(&path)
            .unwrap();
        file.write_all(b"y").unwrap();
    }

    #[test]
    fn test_open_options_read_only_rejects_missing_file() {
        let dir = std::env::temp_dir().join("redirectfs_util_test_missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let err = open_options_from_flags(libc::O_RDONLY as u32)
            .open(dir.join("absent"))
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    }
}
