//! File handles (§3 "File handle"): host-backed (owns an OS descriptor) and
//! memory-backed (borrows a share of a parsed archive's buffer, read-only).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::error::{Error, Result};

pub enum FileHandle {
    Host(HostHandle),
    Memory(MemoryHandle),
}

impl FileHandle {
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        match self {
            FileHandle::Host(h) => h.read_at(offset, len),
            FileHandle::Memory(h) => Ok(h.read_at(offset, len)),
        }
    }

    pub fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        match self {
            FileHandle::Host(h) => h.write_at(offset, buf),
            FileHandle::Memory(_) => Err(Error::ReadOnly),
        }
    }

    pub fn size(&self) -> Result<u64> {
        match self {
            FileHandle::Host(h) => h.size(),
            FileHandle::Memory(h) => Ok(h.size()),
        }
    }

    pub fn truncate(&mut self, len: u64) -> Result<()> {
        match self {
            FileHandle::Host(h) => h.truncate(len),
            FileHandle::Memory(_) => Err(Error::ReadOnly),
        }
    }
}

/// Owns a host OS file descriptor. Dropping the handle closes it.
pub struct HostHandle {
    file: File,
}

impl HostHandle {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        let mut total = 0;
        loop {
            match self.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
            if total == len {
                break;
            }
        }
        buf.truncate(total);
        Ok(buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        Ok(())
    }
}

/// Borrows an immutable byte range of a shared, reference-counted archive
/// buffer. Never outlives the archive it was opened from because it holds
/// its own share of the same `Arc`.
pub struct MemoryHandle {
    buffer: Arc<Vec<u8>>,
    start: usize,
    end: usize,
}

impl MemoryHandle {
    pub fn new(buffer: Arc<Vec<u8>>, start: usize, end: usize) -> Self {
        Self { buffer, start, end }
    }

    fn size(&self) -> u64 {
        (self.end - self.start) as u64
    }

    fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        let avail = self.size();
        if offset >= avail {
            return Vec::new();
        }
        let start = self.start + offset as usize;
        let end = std::cmp::min(start + len, self.end);
        self.buffer[start..end].to_vec()
    }
}
