//! Overlay content directory (§4.2): merges an ordered list of host roots,
//! later entries shadowing earlier ones.

use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::BoundedCache;
use crate::domain::Stat;
use crate::error::{Error, Result};
use crate::handle::FileHandle;
use crate::path_util::join;

use super::host::HostDirectory;

#[derive(Clone)]
pub struct OverlayDirectory {
    roots: Arc<Vec<std::path::PathBuf>>,
    /// Path, relative to each root, that this directory stands for.
    sub: String,
    /// Memoized `_find_parent`: full path -> index of the highest-indexed
    /// root containing it. Shared with every overlay directory the owning
    /// content device hands out.
    find_parent_cache: Arc<BoundedCache<String, Option<usize>>>,
}

impl OverlayDirectory {
    pub fn new(
        roots: Arc<Vec<std::path::PathBuf>>,
        sub: String,
        find_parent_cache: Arc<BoundedCache<String, Option<usize>>>,
    ) -> Self {
        Self {
            roots,
            sub,
            find_parent_cache,
        }
    }

    fn host_at(&self, root: &std::path::Path) -> HostDirectory {
        HostDirectory::new(root.to_path_buf())
    }

    /// Index of the highest-indexed root containing `full` (as file or
    /// directory), memoized.
    fn find_parent(&self, full: &str) -> Option<usize> {
        self.find_parent_cache.get_or_insert_with(full.to_string(), || {
            self.roots
                .iter()
                .enumerate()
                .rev()
                .find(|(_, root)| self.host_at(root).exists(full))
                .map(|(i, _)| i)
        })
    }

    pub fn list_files(&self, rel: &str) -> Result<HashSet<String>> {
        let full = join(&self.sub, rel);
        let mut names = HashSet::new();
        for root in self.roots.iter().rev() {
            if let Ok(entries) = self.host_at(root).list_files(&full) {
                names.extend(entries);
            }
        }
        Ok(names)
    }

    pub fn open_file(&self, rel: &str, write: bool) -> Result<FileHandle> {
        let full = join(&self.sub, rel);
        let idx = self.find_parent(&full).ok_or(Error::NotFound)?;
        self.host_at(&self.roots[idx]).open_file(&full, write)
    }

    pub fn get_file_stats(&self, rel: &str) -> Result<Stat> {
        let full = join(&self.sub, rel);
        let idx = self.find_parent(&full).ok_or(Error::NotFound)?;
        self.host_at(&self.roots[idx]).get_file_stats(&full)
    }

    pub fn exists(&self, rel: &str) -> bool {
        let full = join(&self.sub, rel);
        self.find_parent(&full).is_some()
    }

    pub fn is_dir(&self, rel: &str) -> bool {
        let full = join(&self.sub, rel);
        self.roots
            .iter()
            .any(|root| self.host_at(root).is_dir(&full))
    }
}
