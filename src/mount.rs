//! Mount-host glue (§6): turns an [`Engine`] into a live FUSE mount.
//! Grounded on the teacher's `mount.rs` — same `MountOption` set, foreground
//! `fuser::mount2` call (this CLI has no background-thread/Tauri-command
//! wrapper to return control to, so it blocks until unmounted).

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::engine::Engine;
use crate::filesystem::SarcFs;

fn mount_options(mount_point: &Path) -> Vec<fuser::MountOption> {
    let mut options = vec![
        fuser::MountOption::FSName("sarcfs".to_string()),
        fuser::MountOption::AutoUnmount,
    ];

    let _ = mount_point;
    #[cfg(target_os = "linux")]
    options.push(fuser::MountOption::AllowOther);
    #[cfg(target_os = "macos")]
    {
        options.push(fuser::MountOption::AllowOther);
        options.push(fuser::MountOption::Subtype("sarcfs".to_string()));
    }

    options
}

/// Mounts `engine` at `mount_point` and blocks until the filesystem is
/// unmounted (ctrl-c, `fusermount -u`, or the mount point going away).
pub fn mount(engine: Engine, mount_point: &Path) -> Result<()> {
    info!(mount_point = %mount_point.display(), "mounting");
    let fs = SarcFs::new(engine);
    let options = mount_options(mount_point);
    fuser::mount2(fs, mount_point, &options)
        .with_context(|| format!("failed to mount at {}", mount_point.display()))
}
