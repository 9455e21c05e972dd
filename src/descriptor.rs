//! Descriptor table (§4.5): smallest-available-integer allocator over open
//! file handles, guarded by a single coarse lock shared with handle I/O.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::handle::FileHandle;

#[derive(Default)]
struct Table {
    handles: HashMap<u64, FileHandle>,
    next_hint: u64,
}

/// Owns every open [`FileHandle`] and serializes descriptor allocation plus
/// the read/write/seek sequence on each handle, per §4.5 and §5.
pub struct DescriptorTable {
    inner: Mutex<Table>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Table::default()),
        }
    }

    pub fn allocate(&self, handle: FileHandle) -> u64 {
        let mut t = self.inner.lock();
        let mut fd = t.next_hint;
        while t.handles.contains_key(&fd) {
            fd += 1;
        }
        t.handles.insert(fd, handle);
        t.next_hint = fd + 1;
        fd
    }

    pub fn free(&self, fd: u64) {
        let mut t = self.inner.lock();
        t.handles.remove(&fd);
        t.next_hint = t.next_hint.min(fd);
    }

    pub fn read(&self, fd: u64, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut t = self.inner.lock();
        let handle = t.handles.get_mut(&fd).ok_or(Error::InvalidArgument)?;
        handle.read_at(offset, len)
    }

    pub fn write(&self, fd: u64, offset: u64, buf: &[u8]) -> Result<usize> {
        let mut t = self.inner.lock();
        let handle = t.handles.get_mut(&fd).ok_or(Error::InvalidArgument)?;
        handle.write_at(offset, buf)
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn mem_handle(bytes: &[u8]) -> FileHandle {
        FileHandle::Memory(crate::handle::MemoryHandle::new(
            Arc::new(bytes.to_vec()),
            0,
            bytes.len(),
        ))
    }

    #[test]
    fn allocates_smallest_free_descriptor() {
        let table = DescriptorTable::new();
        let a = table.allocate(mem_handle(b"a"));
        let b = table.allocate(mem_handle(b"b"));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        table.free(a);
        let c = table.allocate(mem_handle(b"c"));
        assert_eq!(c, 0, "freed descriptor should be reused before a new one");
    }

    #[test]
    fn distinct_live_descriptors_stay_distinct() {
        let table = DescriptorTable::new();
        let a = table.allocate(mem_handle(b"a"));
        let b = table.allocate(mem_handle(b"b"));
        assert_ne!(a, b);
        assert_eq!(table.read(a, 0, 1).unwrap(), b"a");
        assert_eq!(table.read(b, 0, 1).unwrap(), b"b");
    }
}
