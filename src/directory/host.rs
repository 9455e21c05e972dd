//! Host directory (§3): a real filesystem subtree, writable per the
//! underlying OS permissions.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use crate::domain::Stat;
use crate::error::{Error, Result};
use crate::handle::{FileHandle, HostHandle};

#[derive(Debug, Clone)]
pub struct HostDirectory {
    pub root: PathBuf,
}

impl HostDirectory {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        if rel == "." {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    /// A `HostDirectory` re-rooted at `rel` (e.g. for `get_directory`
    /// returning a host directory bound to a resolved sub-path).
    pub fn subdir(&self, rel: &str) -> HostDirectory {
        HostDirectory::new(self.resolve(rel))
    }

    pub fn list_files(&self, rel: &str) -> Result<HashSet<String>> {
        let dir = self.resolve(rel);
        let mut names = HashSet::new();
        for entry in fs::read_dir(&dir)? {
            names.insert(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    pub fn open_file(&self, rel: &str, write: bool) -> Result<FileHandle> {
        let path = self.resolve(rel);
        let file: File = if write {
            OpenOptions::new().read(true).write(true).open(&path)?
        } else {
            File::open(&path)?
        };
        Ok(FileHandle::Host(HostHandle::new(file)))
    }

    pub fn create_file(&self, rel: &str) -> Result<FileHandle> {
        let path = self.resolve(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Ok(FileHandle::Host(HostHandle::new(file)))
    }

    pub fn get_file_stats(&self, rel: &str) -> Result<Stat> {
        let meta = fs::metadata(self.resolve(rel))?;
        Ok(Stat::from_metadata(&meta))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).exists()
    }

    pub fn is_dir(&self, rel: &str) -> bool {
        self.resolve(rel).is_dir()
    }

    pub fn create_dir_all(&self, rel: &str) -> Result<()> {
        fs::create_dir_all(self.resolve(rel)).map_err(Error::from)
    }

    pub fn remove_file(&self, rel: &str) -> Result<()> {
        fs::remove_file(self.resolve(rel)).map_err(Error::from)
    }

    pub fn remove_dir(&self, rel: &str) -> Result<()> {
        fs::remove_dir(self.resolve(rel)).map_err(Error::from)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(from, to).map_err(Error::from)
    }

    pub fn truncate(&self, rel: &str, len: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(self.resolve(rel))?;
        file.set_len(len).map_err(Error::from)
    }
}
