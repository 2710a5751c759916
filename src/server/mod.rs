use rfuse3::MountOptions;
use rfuse3::path::{PathFilesystem, Session};
use rfuse3::raw::MountHandle;
use std::ffi::{OsStr, OsString};
use std::io;

/// Mounts a path-based filesystem at `mountpoint` and hands back the running
/// session. Unprivileged mounts go through the fusermount helper so the
/// caller does not need CAP_SYS_ADMIN.
pub async fn mount_filesystem<F: PathFilesystem + Sync + Send + 'static>(
    fs: F,
    mountpoint: &OsStr,
    unprivileged: bool,
) -> io::Result<MountHandle> {
    let mount_path: OsString = OsString::from(mountpoint);

    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };

    let mut mount_options = MountOptions::default();
    mount_options.force_readdir_plus(true).uid(uid).gid(gid);

    if unprivileged {
        Session::<F>::new(mount_options)
            .mount_with_unprivileged(fs, mount_path)
            .await
    } else {
        Session::<F>::new(mount_options).mount(fs, mount_path).await
    }
}
