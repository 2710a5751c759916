//! Redirecting passthrough filesystem (1:1 mapping to a host directory).
//!
//! Every operation the FUSE session delivers is forwarded to the equivalent
//! call on the path composed from the base directory and the virtual path.
//! Nothing is cached, rewritten, or retried: results, bytes, and errors come
//! straight from the underlying filesystem.

pub mod error;
pub mod handle;
pub mod path;
mod xattr;

use std::ffi::{CStr, CString, OsStr};
use std::fs::OpenOptions;
use std::io;
use std::num::NonZeroU32;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use nix::dir::Dir;
use nix::fcntl::{AT_FDCWD, AtFlags, OFlag, RenameFlags, renameat2};
use nix::sys::stat::{
    FchmodatFlags, Mode, SFlag, UtimensatFlags, fchmodat, fstat, fstatat, lstat, mknod, utimensat,
};
use nix::sys::statvfs::statvfs;
use nix::sys::time::TimeSpec;
use nix::unistd::{AccessFlags, Gid, Uid, access, fchownat, mkdir, mkfifo, truncate, unlink};
use rfuse3::path::prelude::*;
use rfuse3::path::reply::{DirectoryEntryPlus, ReplyXAttr};
use rfuse3::{Errno, FileType, Result, SetAttr};

use crate::util::open_options::reply_flags_for;
use crate::util::{file_attr_from_stat, file_type_from_mode, open_options_from_flags};
use handle::HandleTable;

const ATTR_TTL: Duration = Duration::from_secs(1);
const MAX_WRITE: NonZeroU32 = match NonZeroU32::new(128 * 1024) {
    Some(n) => n,
    None => unreachable!(),
};

/// First guess for the symlink target buffer.
const READLINK_INITIAL_CAPACITY: usize = 256;
/// Growth ceiling for the symlink target buffer, far above any PATH_MAX.
const READLINK_MAX_CAPACITY: usize = 64 * 1024;

/// Filesystem that mirrors a base directory under the mount point.
///
/// The base directory is fixed at construction; the handle table is the only
/// state shared between calls. Everything else lives in the underlying
/// filesystem.
pub struct RedirectFs {
    root: PathBuf,
    handles: HandleTable,
}

impl RedirectFs {
    /// Creates a redirecting filesystem rooted at `rootdir`, which must be an
    /// existing directory.
    pub fn new(rootdir: impl AsRef<Path>) -> io::Result<Self> {
        let root = rootdir.as_ref().to_path_buf();
        let meta = std::fs::metadata(&root)?;
        if !meta.is_dir() {
            return Err(io::Error::from_raw_os_error(libc::ENOTDIR));
        }
        Ok(Self {
            root,
            handles: HandleTable::new(),
        })
    }

    fn resolved(&self, virtual_path: &OsStr) -> PathBuf {
        path::resolve(&self.root, virtual_path)
    }

    fn stat_virtual(&self, virtual_path: &OsStr) -> Result<rfuse3::path::reply::FileAttr> {
        let underlying = self.resolved(virtual_path);
        let st = lstat(&underlying).map_err(error::from_nix)?;
        Ok(file_attr_from_stat(&st))
    }
}

fn cstring_from_path(underlying: &Path) -> Result<CString> {
    CString::new(underlying.as_os_str().as_bytes()).map_err(|_| Errno::from(libc::EINVAL))
}

fn cstring_from_os(name: &OsStr) -> Result<CString> {
    CString::new(name.as_bytes()).map_err(|_| Errno::from(libc::EINVAL))
}

/// Reads a symlink target with a buffer that doubles whenever the kernel
/// fills it completely; readlink reports no truncation, so a full buffer is
/// the only signal that the target may not have fit.
fn read_link_native(underlying: &CStr) -> Result<Vec<u8>> {
    let mut capacity = READLINK_INITIAL_CAPACITY;
    loop {
        let mut buf = vec![0u8; capacity];
        let res = unsafe {
            libc::readlink(
                underlying.as_ptr(),
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
            )
        };
        if res < 0 {
            return Err(error::from_io(io::Error::last_os_error()));
        }
        let len = res as usize;
        if len < capacity {
            buf.truncate(len);
            return Ok(buf);
        }
        capacity *= 2;
        if capacity > READLINK_MAX_CAPACITY {
            return Err(Errno::from(libc::ENAMETOOLONG));
        }
    }
}

fn dir_entry_kind(dirfd: BorrowedFd<'_>, entry: &nix::dir::Entry) -> FileType {
    match entry.file_type() {
        Some(nix::dir::Type::Directory) => FileType::Directory,
        Some(nix::dir::Type::Symlink) => FileType::Symlink,
        Some(nix::dir::Type::File) => FileType::RegularFile,
        Some(nix::dir::Type::BlockDevice) => FileType::BlockDevice,
        Some(nix::dir::Type::CharacterDevice) => FileType::CharDevice,
        Some(nix::dir::Type::Fifo) => FileType::NamedPipe,
        Some(nix::dir::Type::Socket) => FileType::Socket,
        // DT_UNKNOWN: the backing filesystem wants an explicit stat.
        None => fstatat(dirfd, entry.file_name(), AtFlags::AT_SYMLINK_NOFOLLOW)
            .map(|st| file_type_from_mode(st.st_mode))
            .unwrap_or(FileType::RegularFile),
    }
}

impl PathFilesystem for RedirectFs {
    async fn init(&self, _req: Request) -> Result<ReplyInit> {
        debug!("init root={:?}", self.root);
        Ok(ReplyInit {
            max_write: MAX_WRITE,
        })
    }

    async fn destroy(&self, _req: Request) {}

    async fn lookup(&self, _req: Request, parent: &OsStr, name: &OsStr) -> Result<ReplyEntry> {
        let attr = self.stat_virtual(&path::child(parent, name))?;
        Ok(ReplyEntry {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn getattr(
        &self,
        _req: Request,
        virtual_path: Option<&OsStr>,
        fh: Option<u64>,
        _flags: u32,
    ) -> Result<ReplyAttr> {
        // Prefer the open descriptor: it stays accurate for files that were
        // unlinked or renamed after open, which a fresh path lookup is not.
        if let Some(handle) = fh.and_then(|fh| self.handles.get(fh)) {
            let st = fstat(handle.as_fd()).map_err(error::from_nix)?;
            return Ok(ReplyAttr {
                ttl: ATTR_TTL,
                attr: file_attr_from_stat(&st),
            });
        }

        let virtual_path = virtual_path.ok_or_else(|| Errno::from(libc::ENOENT))?;
        let attr = self.stat_virtual(virtual_path)?;
        Ok(ReplyAttr {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn setattr(
        &self,
        _req: Request,
        virtual_path: Option<&OsStr>,
        fh: Option<u64>,
        set_attr: SetAttr,
    ) -> Result<ReplyAttr> {
        debug!("setattr path={:?} fh={:?} {:?}", virtual_path, fh, set_attr);

        if let Some(size) = set_attr.size {
            // Truncate through the open descriptor when the session holds
            // one; the path variant is for callers without an open handle.
            match fh.and_then(|fh| self.handles.get_file(fh)) {
                Some(file) => file.set_len(size).map_err(error::from_io)?,
                None => {
                    let virtual_path =
                        virtual_path.ok_or_else(|| Errno::from(libc::ENOENT))?;
                    let underlying = self.resolved(virtual_path);
                    truncate(&underlying, size as libc::off_t).map_err(error::from_nix)?;
                }
            }
        }

        if set_attr.mode.is_some()
            || set_attr.uid.is_some()
            || set_attr.gid.is_some()
            || set_attr.atime.is_some()
            || set_attr.mtime.is_some()
        {
            let virtual_path = virtual_path.ok_or_else(|| Errno::from(libc::ENOENT))?;
            let underlying = self.resolved(virtual_path);

            if let Some(mode) = set_attr.mode {
                fchmodat(
                    AT_FDCWD,
                    &underlying,
                    Mode::from_bits_truncate(mode),
                    FchmodatFlags::FollowSymlink,
                )
                .map_err(error::from_nix)?;
            }

            if set_attr.uid.is_some() || set_attr.gid.is_some() {
                // Ownership changes must not chase symlinks, or the change
                // would land on the link target.
                fchownat(
                    AT_FDCWD,
                    &underlying,
                    set_attr.uid.map(Uid::from_raw),
                    set_attr.gid.map(Gid::from_raw),
                    AtFlags::AT_SYMLINK_NOFOLLOW,
                )
                .map_err(error::from_nix)?;
            }

            if set_attr.atime.is_some() || set_attr.mtime.is_some() {
                let atime = set_attr
                    .atime
                    .map(|t| TimeSpec::new(t.sec, t.nsec as _))
                    .unwrap_or(TimeSpec::UTIME_OMIT);
                let mtime = set_attr
                    .mtime
                    .map(|t| TimeSpec::new(t.sec, t.nsec as _))
                    .unwrap_or(TimeSpec::UTIME_OMIT);
                utimensat(
                    AT_FDCWD,
                    &underlying,
                    &atime,
                    &mtime,
                    UtimensatFlags::FollowSymlink,
                )
                .map_err(error::from_nix)?;
            }
        }

        match virtual_path {
            Some(virtual_path) => Ok(ReplyAttr {
                ttl: ATTR_TTL,
                attr: self.stat_virtual(virtual_path)?,
            }),
            None => {
                let handle = fh
                    .and_then(|fh| self.handles.get(fh))
                    .ok_or_else(|| Errno::from(libc::EBADF))?;
                let st = fstat(handle.as_fd()).map_err(error::from_nix)?;
                Ok(ReplyAttr {
                    ttl: ATTR_TTL,
                    attr: file_attr_from_stat(&st),
                })
            }
        }
    }

    async fn readlink(&self, _req: Request, virtual_path: &OsStr) -> Result<ReplyData> {
        let underlying = cstring_from_path(&self.resolved(virtual_path))?;
        let target = read_link_native(&underlying)?;
        Ok(Bytes::from(target).into())
    }

    async fn symlink(
        &self,
        _req: Request,
        parent: &OsStr,
        name: &OsStr,
        link_path: &OsStr,
    ) -> Result<ReplyEntry> {
        let virtual_path = path::child(parent, name);
        let underlying = self.resolved(&virtual_path);
        debug!("symlink {:?} -> {:?}", underlying, link_path);
        // The target is stored verbatim; it is interpreted at traversal time,
        // not resolved against the base directory now.
        std::os::unix::fs::symlink(Path::new(link_path), &underlying)
            .map_err(error::from_io)?;
        let attr = self.stat_virtual(&virtual_path)?;
        Ok(ReplyEntry {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn mknod(
        &self,
        _req: Request,
        parent: &OsStr,
        name: &OsStr,
        mode: u32,
        rdev: u32,
    ) -> Result<ReplyEntry> {
        let virtual_path = path::child(parent, name);
        let underlying = self.resolved(&virtual_path);
        debug!("mknod {:?} mode={:o} rdev={}", underlying, mode, rdev);

        match mode & libc::S_IFMT {
            // Exclusive create-then-close works on backends that reject
            // mknod for regular files.
            libc::S_IFREG => {
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(mode & 0o7777)
                    .open(&underlying)
                    .map_err(error::from_io)?;
            }
            libc::S_IFIFO => {
                mkfifo(&underlying, Mode::from_bits_truncate(mode)).map_err(error::from_nix)?;
            }
            _ => {
                mknod(
                    &underlying,
                    SFlag::from_bits_truncate(mode),
                    Mode::from_bits_truncate(mode),
                    rdev as libc::dev_t,
                )
                .map_err(error::from_nix)?;
            }
        }

        let attr = self.stat_virtual(&virtual_path)?;
        Ok(ReplyEntry {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn mkdir(
        &self,
        _req: Request,
        parent: &OsStr,
        name: &OsStr,
        mode: u32,
        _umask: u32,
    ) -> Result<ReplyEntry> {
        let virtual_path = path::child(parent, name);
        let underlying = self.resolved(&virtual_path);
        debug!("mkdir {:?} mode={:o}", underlying, mode);
        mkdir(&underlying, Mode::from_bits_truncate(mode)).map_err(error::from_nix)?;
        let attr = self.stat_virtual(&virtual_path)?;
        Ok(ReplyEntry {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn unlink(&self, _req: Request, parent: &OsStr, name: &OsStr) -> Result<()> {
        let underlying = self.resolved(&path::child(parent, name));
        debug!("unlink {:?}", underlying);
        unlink(&underlying).map_err(error::from_nix)
    }

    async fn rmdir(&self, _req: Request, parent: &OsStr, name: &OsStr) -> Result<()> {
        let underlying = self.resolved(&path::child(parent, name));
        debug!("rmdir {:?}", underlying);
        std::fs::remove_dir(&underlying).map_err(error::from_io)
    }

    async fn rename(
        &self,
        _req: Request,
        origin_parent: &OsStr,
        origin_name: &OsStr,
        parent: &OsStr,
        name: &OsStr,
    ) -> Result<()> {
        let from = self.resolved(&path::child(origin_parent, origin_name));
        let to = self.resolved(&path::child(parent, name));
        debug!("rename {:?} -> {:?}", from, to);
        std::fs::rename(&from, &to).map_err(error::from_io)
    }

    async fn rename2(
        &self,
        req: Request,
        origin_parent: &OsStr,
        origin_name: &OsStr,
        parent: &OsStr,
        name: &OsStr,
        flags: u32,
    ) -> Result<()> {
        if flags == 0 {
            return self
                .rename(req, origin_parent, origin_name, parent, name)
                .await;
        }
        let from = self.resolved(&path::child(origin_parent, origin_name));
        let to = self.resolved(&path::child(parent, name));
        debug!("rename2 {:?} -> {:?} flags={:#x}", from, to, flags);
        renameat2(
            AT_FDCWD,
            &from,
            AT_FDCWD,
            &to,
            RenameFlags::from_bits_truncate(flags),
        )
        .map_err(error::from_nix)
    }

    async fn link(
        &self,
        _req: Request,
        virtual_path: &OsStr,
        new_parent: &OsStr,
        new_name: &OsStr,
    ) -> Result<ReplyEntry> {
        let from = self.resolved(virtual_path);
        let new_virtual = path::child(new_parent, new_name);
        let to = self.resolved(&new_virtual);
        debug!("link {:?} -> {:?}", from, to);
        std::fs::hard_link(&from, &to).map_err(error::from_io)?;
        let attr = self.stat_virtual(&new_virtual)?;
        Ok(ReplyEntry {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn open(&self, _req: Request, virtual_path: &OsStr, flags: u32) -> Result<ReplyOpen> {
        let underlying = self.resolved(virtual_path);
        debug!("open {:?} flags={:#x}", underlying, flags);
        let file = open_options_from_flags(flags)
            .open(&underlying)
            .map_err(error::from_io)?;
        let fh = self.handles.insert_file(file);
        Ok(ReplyOpen {
            fh,
            flags: reply_flags_for(flags),
        })
    }

    async fn create(
        &self,
        _req: Request,
        parent: &OsStr,
        name: &OsStr,
        mode: u32,
        flags: u32,
    ) -> Result<ReplyCreated> {
        let underlying = self.resolved(&path::child(parent, name));
        debug!("create {:?} mode={:o} flags={:#x}", underlying, mode, flags);
        let mut options = open_options_from_flags(flags);
        options.create(true).mode(mode & 0o7777);
        let file = options.open(&underlying).map_err(error::from_io)?;
        let st = fstat(file.as_fd()).map_err(error::from_nix)?;
        let fh = self.handles.insert_file(file);
        Ok(ReplyCreated {
            ttl: ATTR_TTL,
            attr: file_attr_from_stat(&st),
            generation: 0,
            fh,
            flags: reply_flags_for(flags),
        })
    }

    async fn read(
        &self,
        _req: Request,
        _virtual_path: Option<&OsStr>,
        fh: u64,
        offset: u64,
        size: u32,
    ) -> Result<ReplyData> {
        let file = self
            .handles
            .get_file(fh)
            .ok_or_else(|| Errno::from(libc::EBADF))?;
        let mut buf = vec![0u8; size as usize];
        // One positional read; a short count is a valid result, not an error.
        let read = file.read_at(&mut buf, offset).map_err(error::from_io)?;
        buf.truncate(read);
        Ok(Bytes::from(buf).into())
    }

    async fn write(
        &self,
        _req: Request,
        _virtual_path: Option<&OsStr>,
        fh: u64,
        offset: u64,
        data: &[u8],
        _write_flags: u32,
        _flags: u32,
    ) -> Result<ReplyWrite> {
        let file = self
            .handles
            .get_file(fh)
            .ok_or_else(|| Errno::from(libc::EBADF))?;
        // Partial writes are reported as-is; the kernel resubmits the rest.
        let written = file.write_at(data, offset).map_err(error::from_io)?;
        Ok(ReplyWrite {
            written: written as u32,
        })
    }

    async fn flush(
        &self,
        _req: Request,
        _virtual_path: Option<&OsStr>,
        fh: u64,
        _lock_owner: u64,
    ) -> Result<()> {
        debug!("flush fh={}", fh);
        let file = self
            .handles
            .get_file(fh)
            .ok_or_else(|| Errno::from(libc::EBADF))?;
        // Flush runs on every close of a duplicated client descriptor and may
        // repeat; closing a duplicate surfaces close-time errors (NFS-style
        // backends) while the session's descriptor stays open.
        let duplicate = file.try_clone().map_err(error::from_io)?;
        drop(duplicate);
        Ok(())
    }

    async fn release(
        &self,
        _req: Request,
        _virtual_path: Option<&OsStr>,
        fh: u64,
        _flags: u32,
        _lock_owner: u64,
        _flush: bool,
    ) -> Result<()> {
        debug!("release fh={}", fh);
        self.handles.remove(fh);
        Ok(())
    }

    async fn fsync(
        &self,
        _req: Request,
        _virtual_path: Option<&OsStr>,
        fh: u64,
        datasync: bool,
    ) -> Result<()> {
        let file = self
            .handles
            .get_file(fh)
            .ok_or_else(|| Errno::from(libc::EBADF))?;
        if datasync {
            file.sync_data().map_err(error::from_io)
        } else {
            file.sync_all().map_err(error::from_io)
        }
    }

    async fn setxattr(
        &self,
        _req: Request,
        virtual_path: &OsStr,
        name: &OsStr,
        value: &[u8],
        flags: u32,
        position: u32,
    ) -> Result<()> {
        if position != 0 {
            return Err(Errno::from(libc::EINVAL));
        }
        let underlying = cstring_from_path(&self.resolved(virtual_path))?;
        let name = cstring_from_os(name)?;
        xattr::lsetxattr(&underlying, &name, value, flags as i32).map_err(error::from_io)
    }

    async fn getxattr(
        &self,
        _req: Request,
        virtual_path: &OsStr,
        name: &OsStr,
        size: u32,
    ) -> Result<ReplyXAttr> {
        let underlying = cstring_from_path(&self.resolved(virtual_path))?;
        let name = cstring_from_os(name)?;
        // Zero-length buffer is the size probe.
        if size == 0 {
            let required = xattr::lgetxattr(&underlying, &name, &mut []).map_err(error::from_io)?;
            return Ok(ReplyXAttr::Size(required as u32));
        }
        let mut buf = vec![0u8; size as usize];
        let len = xattr::lgetxattr(&underlying, &name, &mut buf).map_err(error::from_io)?;
        buf.truncate(len);
        Ok(ReplyXAttr::Data(Bytes::from(buf)))
    }

    async fn listxattr(
        &self,
        _req: Request,
        virtual_path: &OsStr,
        size: u32,
    ) -> Result<ReplyXAttr> {
        let underlying = cstring_from_path(&self.resolved(virtual_path))?;
        if size == 0 {
            let required = xattr::llistxattr(&underlying, &mut []).map_err(error::from_io)?;
            return Ok(ReplyXAttr::Size(required as u32));
        }
        let mut buf = vec![0u8; size as usize];
        let len = xattr::llistxattr(&underlying, &mut buf).map_err(error::from_io)?;
        buf.truncate(len);
        Ok(ReplyXAttr::Data(Bytes::from(buf)))
    }

    async fn removexattr(&self, _req: Request, virtual_path: &OsStr, name: &OsStr) -> Result<()> {
        let underlying = cstring_from_path(&self.resolved(virtual_path))?;
        let name = cstring_from_os(name)?;
        xattr::lremovexattr(&underlying, &name).map_err(error::from_io)
    }

    async fn access(&self, _req: Request, virtual_path: &OsStr, mask: u32) -> Result<()> {
        let underlying = self.resolved(virtual_path);
        access(&underlying, AccessFlags::from_bits_truncate(mask as i32))
            .map_err(error::from_nix)
    }

    async fn opendir(&self, _req: Request, virtual_path: &OsStr, _flags: u32) -> Result<ReplyOpen> {
        let underlying = self.resolved(virtual_path);
        debug!("opendir {:?}", underlying);
        let dir = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_DIRECTORY)
            .open(&underlying)
            .map_err(error::from_io)?;
        let fh = self.handles.insert_dir(dir);
        Ok(ReplyOpen { fh, flags: 0 })
    }

    type DirEntryStream<'a>
        = futures_util::stream::Iter<std::vec::IntoIter<Result<DirectoryEntry>>>
    where
        Self: 'a;
    type DirEntryPlusStream<'a>
        = futures_util::stream::Iter<std::vec::IntoIter<Result<DirectoryEntryPlus>>>
    where
        Self: 'a;

    async fn readdir<'a>(
        &'a self,
        _req: Request,
        virtual_path: &'a OsStr,
        fh: u64,
        offset: i64,
    ) -> Result<ReplyDirectory<Self::DirEntryStream<'a>>> {
        debug!("readdir path={:?} fh={} offset={}", virtual_path, fh, offset);
        let handle = self
            .handles
            .get_dir(fh)
            .ok_or_else(|| Errno::from(libc::EBADF))?;

        // Enumerate through the stored descriptor, never through the path, so
        // an enumeration session survives a concurrent rename of the
        // directory. Entries come back in whatever order the backing
        // filesystem yields, "." and ".." included.
        let mut dir = Dir::openat(
            handle.as_fd(),
            ".",
            OFlag::O_RDONLY | OFlag::O_CLOEXEC,
            Mode::empty(),
        )
        .map_err(error::from_nix)?;

        let mut entries: Vec<Result<DirectoryEntry>> = Vec::new();
        for entry in dir.iter() {
            match entry {
                Ok(entry) => {
                    let kind = dir_entry_kind(handle.as_fd(), &entry);
                    let name = OsStr::from_bytes(entry.file_name().to_bytes()).to_os_string();
                    entries.push(Ok(DirectoryEntry {
                        kind,
                        name,
                        offset: entries.len() as i64 + 1,
                    }));
                }
                Err(err) => entries.push(Err(error::from_nix(err))),
            }
        }

        let entries: Vec<_> = entries.into_iter().skip(offset.max(0) as usize).collect();
        Ok(ReplyDirectory {
            entries: futures_util::stream::iter(entries),
        })
    }

    async fn readdirplus<'a>(
        &'a self,
        _req: Request,
        parent: &'a OsStr,
        fh: u64,
        offset: u64,
        _lock_owner: u64,
    ) -> Result<ReplyDirectoryPlus<Self::DirEntryPlusStream<'a>>> {
        debug!("readdirplus path={:?} fh={} offset={}", parent, fh, offset);
        let handle = self
            .handles
            .get_dir(fh)
            .ok_or_else(|| Errno::from(libc::EBADF))?;

        let mut dir = Dir::openat(
            handle.as_fd(),
            ".",
            OFlag::O_RDONLY | OFlag::O_CLOEXEC,
            Mode::empty(),
        )
        .map_err(error::from_nix)?;

        let mut entries: Vec<Result<DirectoryEntryPlus>> = Vec::new();
        for entry in dir.iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    entries.push(Err(error::from_nix(err)));
                    continue;
                }
            };
            let attr = match fstatat(
                handle.as_fd(),
                entry.file_name(),
                AtFlags::AT_SYMLINK_NOFOLLOW,
            ) {
                Ok(st) => file_attr_from_stat(&st),
                Err(err) => {
                    entries.push(Err(error::from_nix(err)));
                    continue;
                }
            };
            let name = OsStr::from_bytes(entry.file_name().to_bytes()).to_os_string();
            entries.push(Ok(DirectoryEntryPlus {
                kind: attr.kind,
                name,
                offset: entries.len() as i64 + 1,
                attr,
                entry_ttl: ATTR_TTL,
                attr_ttl: ATTR_TTL,
            }));
        }

        let entries: Vec<_> = entries.into_iter().skip(offset as usize).collect();
        Ok(ReplyDirectoryPlus {
            entries: futures_util::stream::iter(entries),
        })
    }

    async fn releasedir(
        &self,
        _req: Request,
        _virtual_path: &OsStr,
        fh: u64,
        _flags: u32,
    ) -> Result<()> {
        debug!("releasedir fh={}", fh);
        self.handles.remove(fh);
        Ok(())
    }

    async fn fsyncdir(
        &self,
        _req: Request,
        _virtual_path: &OsStr,
        fh: u64,
        datasync: bool,
    ) -> Result<()> {
        let dir = self
            .handles
            .get_dir(fh)
            .ok_or_else(|| Errno::from(libc::EBADF))?;
        if datasync {
            dir.sync_data().map_err(error::from_io)
        } else {
            dir.sync_all().map_err(error::from_io)
        }
    }

    async fn statfs(&self, _req: Request, virtual_path: &OsStr) -> Result<ReplyStatFs> {
        let underlying = self.resolved(virtual_path);
        let stats = statvfs(&underlying).map_err(error::from_nix)?;
        Ok(ReplyStatFs {
            blocks: stats.blocks(),
            bfree: stats.blocks_free(),
            bavail: stats.blocks_available(),
            files: stats.files(),
            ffree: stats.files_free(),
            bsize: stats.block_size() as u32,
            namelen: stats.name_max() as u32,
            frsize: stats.fragment_size() as u32,
        })
    }
}
