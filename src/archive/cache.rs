//! Archive cache (§4.4): bounded, memoized `(base, path) -> parsed archive`,
//! with single-flight deduplication on concurrent misses for the same key.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::sarc::Archive;
use crate::directory::Directory;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub base: &'static str,
    pub path: String,
}

/// What an archive-cache hit yields: the parsed archive plus the directory
/// that produced it, needed to serve the raw-archive pseudofile and to
/// inherit stat (§3 "Ownership summary").
pub struct CacheEntry {
    pub archive: Arc<Archive>,
    pub buffer: Arc<Vec<u8>>,
    pub parent: Directory,
}

type Cell = Arc<OnceLock<std::result::Result<Arc<CacheEntry>, String>>>;

struct Inner {
    capacity: usize,
    cells: HashMap<CacheKey, Cell>,
    order: VecDeque<CacheKey>,
}

pub struct ArchiveCache {
    inner: Mutex<Inner>,
}

impl ArchiveCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                cells: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Returns the cached entry for `key`, computing it via `produce` on a
    /// miss. Concurrent misses on the same key block behind one another
    /// (whichever thread wins the race to create the cell does the parse;
    /// the rest observe its result).
    pub fn get_or_parse(
        &self,
        key: CacheKey,
        produce: impl FnOnce() -> Result<CacheEntry>,
    ) -> Result<Arc<CacheEntry>> {
        let cell = {
            let mut inner = self.inner.lock();
            if let Some(cell) = inner.cells.get(&key) {
                tracing::debug!(base = key.base, path = %key.path, "archive cache hit");
                cell.clone()
            } else {
                tracing::debug!(base = key.base, path = %key.path, "archive cache miss");
                let cell: Cell = Arc::new(OnceLock::new());
                inner.evict_if_full();
                inner.cells.insert(key.clone(), cell.clone());
                inner.order.push_back(key.clone());
                cell
            }
        };
        cell.get_or_init(|| produce().map(Arc::new).map_err(|e| e.to_string()))
            .clone()
            .map_err(crate::error::Error::Parse)
    }
}

impl Inner {
    fn evict_if_full(&mut self) {
        while self.cells.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.cells.remove(&oldest);
            } else {
                break;
            }
        }
    }
}
