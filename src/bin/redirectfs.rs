// Mounts a mirror of a base directory: every operation on the mount point is
// redirected to the same path under --rootdir.

use clap::Parser;
use redirectfs::passthrough::RedirectFs;
use redirectfs::server::mount_filesystem;
use std::ffi::OsString;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mirror a base directory at a mount point")]
struct Args {
    /// Path to mount point
    #[arg(long)]
    mountpoint: String,
    /// Base directory whose tree is exposed at the mount point
    #[arg(long)]
    rootdir: String,
    /// Use privileged mount instead of unprivileged (default false)
    #[arg(long, default_value_t = false)]
    not_unprivileged: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let fs = match RedirectFs::new(&args.rootdir) {
        Ok(fs) => fs,
        Err(err) => {
            eprintln!("redirectfs: {}: {err}", args.rootdir);
            std::process::exit(1);
        }
    };

    let mount_path = OsString::from(&args.mountpoint);
    let mut mount_handle = mount_filesystem(fs, &mount_path, !args.not_unprivileged)
        .await
        .expect("Failed to mount filesystem");

    let handle = &mut mount_handle;
    tokio::select! {
        res = handle => res.unwrap(),
        _ = signal::ctrl_c() => {
            mount_handle.unmount().await.unwrap();
        }
    }
}
