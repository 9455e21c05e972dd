//! Content device (§2, §4.2): owns the ordered list of content roots and
//! memoizes `isdir`/`try_open_dir` decisions; factory for overlay content
//! directories.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::BoundedCache;
use crate::directory::OverlayDirectory;

const FIND_PARENT_CACHE_CAPACITY: usize = 50_000;
const ISDIR_CACHE_CAPACITY: usize = 50_000;

pub struct ContentDevice {
    roots: Arc<Vec<PathBuf>>,
    isdir_cache: BoundedCache<String, bool>,
    find_parent_cache: Arc<BoundedCache<String, Option<usize>>>,
}

impl ContentDevice {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots: Arc::new(roots),
            isdir_cache: BoundedCache::new(ISDIR_CACHE_CAPACITY),
            find_parent_cache: Arc::new(BoundedCache::new(FIND_PARENT_CACHE_CAPACITY)),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// True iff at least one content root contains `sub` as a directory.
    pub fn is_dir(&self, sub: &str) -> bool {
        self.isdir_cache.get_or_insert_with(sub.to_string(), || {
            self.roots
                .iter()
                .any(|root| crate::directory::HostDirectory::new(root.clone()).is_dir(sub))
        })
    }

    /// Returns an overlay view rooted at `sub`, if `sub` addresses a
    /// directory on at least one content root.
    pub fn try_open_dir(&self, sub: &str) -> Option<OverlayDirectory> {
        if self.is_dir(sub) {
            Some(self.overlay_at(sub))
        } else {
            None
        }
    }

    pub fn overlay_at(&self, sub: &str) -> OverlayDirectory {
        OverlayDirectory::new(self.roots.clone(), sub.to_string(), self.find_parent_cache.clone())
    }

    pub fn root_overlay(&self) -> OverlayDirectory {
        self.overlay_at(".")
    }
}
