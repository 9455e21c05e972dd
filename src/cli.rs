//! Command-line surface (§6): `sarcfs <content_dir>... <mount_point> [-w <work_dir>]`.
//!
//! `clap`'s derive API is the pack-wide choice for this kind of tool (see
//! `fuser-tests` in the `fuser` workspace); the teacher itself has no CLI of
//! its own to imitate here.

use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sarcfs", about = "Transparent, copy-on-write FUSE view over a layered SARC content tree")]
pub struct Cli {
    /// Content roots, lowest priority first. Later roots shadow earlier ones.
    #[arg(required = true, num_args = 1..)]
    pub content_dirs: Vec<PathBuf>,

    /// Where to mount the filesystem.
    pub mount_point: PathBuf,

    /// Directory writes are promoted into. Omit to mount read-only.
    #[arg(short = 'w', long = "work-dir")]
    pub work_dir: Option<PathBuf>,
}

pub struct Args {
    pub content_dirs: Vec<PathBuf>,
    pub mount_point: PathBuf,
    pub work_dir: Option<PathBuf>,
}

impl Cli {
    /// Validates every path argument exists as a directory, canonicalizing
    /// each in place. Exits the process with `error: <path> is not a
    /// directory` on the first failure, matching the reference tool's CLI.
    pub fn into_validated_args(self) -> Args {
        let content_dirs = self
            .content_dirs
            .iter()
            .map(|p| require_dir(p))
            .collect();
        let mount_point = require_dir(&self.mount_point);
        let work_dir = self.work_dir.as_deref().map(require_dir);

        Args {
            content_dirs,
            mount_point,
            work_dir,
        }
    }
}

fn require_dir(path: &Path) -> PathBuf {
    if !path.is_dir() {
        eprintln!("error: {} is not a directory", path.display());
        std::process::exit(1);
    }
    path.canonicalize().unwrap_or_else(|e| {
        eprintln!("error: {}: {e}", path.display());
        std::process::exit(1);
    })
}
