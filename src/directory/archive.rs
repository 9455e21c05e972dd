//! Archive directory (§4.3): the synthesized view presented at an archive
//! file's path, backed by a parsed archive and a back-reference to the
//! directory that opened it.

use std::collections::HashSet;
use std::sync::Arc;

use crate::archive::Archive;
use crate::domain::Stat;
use crate::error::{Error, Result};
use crate::handle::{FileHandle, MemoryHandle};
use crate::path_util::{first_segment, RAW_ARCHIVE_NAME};

use super::Directory;

#[derive(Clone)]
pub struct ArchiveDirectory {
    archive: Arc<Archive>,
    buffer: Arc<Vec<u8>>,
    /// The directory the archive file itself lives in.
    parent: Box<Directory>,
    /// Path of the archive file, relative to `parent`.
    archive_path: String,
}

impl ArchiveDirectory {
    pub fn new(
        archive: Arc<Archive>,
        buffer: Arc<Vec<u8>>,
        parent: Directory,
        archive_path: String,
    ) -> Self {
        Self {
            archive,
            buffer,
            parent: Box::new(parent),
            archive_path,
        }
    }

    fn archive_stat(&self) -> Result<Stat> {
        self.parent.get_file_stats(&self.archive_path)
    }

    pub fn list_files(&self, sub: &str) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        if sub == "." {
            for name in self.archive.file_names() {
                let stripped = name.strip_prefix('/').unwrap_or(name);
                let (first, _) = first_segment(stripped);
                names.insert(first.to_string());
            }
            names.insert(RAW_ARCHIVE_NAME.to_string());
        } else {
            let prefix = format!("{sub}/");
            for name in self.archive.file_names() {
                let stripped = name.strip_prefix('/').unwrap_or(name);
                if let Some(rest) = stripped.strip_prefix(prefix.as_str()) {
                    let (first, _) = first_segment(rest);
                    names.insert(first.to_string());
                }
            }
        }
        Ok(names)
    }

    pub fn open_file(&self, sub: &str, write: bool) -> Result<FileHandle> {
        if write {
            return Err(Error::ReadOnly);
        }
        if sub == RAW_ARCHIVE_NAME {
            return self.parent.open_file(&self.archive_path, false);
        }
        self.archive
            .range_of(sub)
            .map(|(start, end)| FileHandle::Memory(MemoryHandle::new(self.buffer.clone(), start, end)))
            .ok_or(Error::NotFound)
    }

    pub fn get_file_stats(&self, sub: &str) -> Result<Stat> {
        let base = self.archive_stat()?;
        if sub == "." {
            return Ok(base.as_archive_root_dir());
        }
        if sub == RAW_ARCHIVE_NAME {
            return Ok(base);
        }
        if let Some(size) = self.archive.size_of(sub) {
            return Ok(base.as_archive_member_file(size));
        }
        let prefix = format!("{sub}/");
        let is_synth_dir = self
            .archive
            .file_names()
            .any(|name| name.strip_prefix('/').unwrap_or(name).contains(prefix.as_str()));
        if is_synth_dir {
            Ok(base.as_archive_member_dir())
        } else {
            Err(Error::NotFound)
        }
    }
}
