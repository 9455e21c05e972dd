//! Directory providers (§2, §3): a capability shared by three backings —
//! host directory, archive directory, overlay content directory — dispatched
//! as a tagged sum, per the design note in §9 ("equivalent to three trait
//! implementations").

pub mod archive;
pub mod host;
pub mod overlay;

use std::collections::HashSet;

use crate::domain::Stat;
use crate::error::Result;
use crate::handle::FileHandle;

pub use archive::ArchiveDirectory;
pub use host::HostDirectory;
pub use overlay::OverlayDirectory;

#[derive(Clone)]
pub enum Directory {
    Host(HostDirectory),
    Archive(ArchiveDirectory),
    Overlay(OverlayDirectory),
}

impl Directory {
    pub fn list_files(&self, rel: &str) -> Result<HashSet<String>> {
        match self {
            Directory::Host(d) => d.list_files(rel),
            Directory::Archive(d) => d.list_files(rel),
            Directory::Overlay(d) => d.list_files(rel),
        }
    }

    pub fn open_file(&self, rel: &str, write: bool) -> Result<FileHandle> {
        match self {
            Directory::Host(d) => d.open_file(rel, write),
            Directory::Archive(d) => d.open_file(rel, write),
            Directory::Overlay(d) => d.open_file(rel, write),
        }
    }

    pub fn get_file_stats(&self, rel: &str) -> Result<Stat> {
        match self {
            Directory::Host(d) => d.get_file_stats(rel),
            Directory::Archive(d) => d.get_file_stats(rel),
            Directory::Overlay(d) => d.get_file_stats(rel),
        }
    }
}
