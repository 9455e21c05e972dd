//! The operations object (§2 item 7, §4.6): translates each filesystem
//! callback into calls on the directory/archive/descriptor layers below,
//! applying the copy-on-write policy. Independent of any particular mount
//! host binding — [`crate::filesystem`] adapts this to `fuser`'s trait.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::{Archive, ArchiveCache, CacheEntry, CacheKey};
use crate::content::ContentDevice;
use crate::descriptor::DescriptorTable;
use crate::directory::{ArchiveDirectory, Directory, HostDirectory};
use crate::domain::Stat;
use crate::error::{Error, Result};
use crate::path_util::{is_archive_name, relative_to, split_parent};

const ARCHIVE_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseKind {
    Content,
    Work,
}

impl BaseKind {
    fn tag(self) -> &'static str {
        match self {
            BaseKind::Content => "content",
            BaseKind::Work => "work",
        }
    }
}

/// Disk-usage summary for `statfs` (§4.6).
pub struct FsStats {
    pub block_size: u64,
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
    pub files: u64,
    pub files_free: u64,
    pub name_max: u32,
}

pub struct Engine {
    content: ContentDevice,
    work: Option<HostDirectory>,
    archive_cache: ArchiveCache,
    descriptors: DescriptorTable,
}

impl Engine {
    pub fn new(content_dirs: Vec<PathBuf>, work_dir: Option<PathBuf>) -> Self {
        for (i, dir) in content_dirs.iter().enumerate() {
            tracing::info!(index = i, root = %dir.display(), "registering content root");
        }
        if let Some(dir) = &work_dir {
            tracing::info!(root = %dir.display(), "registering work directory");
        }
        Self {
            content: ContentDevice::new(content_dirs),
            work: work_dir.map(HostDirectory::new),
            archive_cache: ArchiveCache::new(ARCHIVE_CACHE_CAPACITY),
            descriptors: DescriptorTable::new(),
        }
    }

    fn work(&self) -> Result<&HostDirectory> {
        self.work.as_ref().ok_or(Error::ReadOnly)
    }

    /// `get_directory` (§4.1): returns the directory standing at (or, when
    /// called with a parent path, containing) `path`, plus that directory's
    /// own path — needed by callers to translate `path` into a
    /// directory-relative name.
    fn get_directory(&self, base: BaseKind, path: &str) -> Result<(Directory, String)> {
        let mut candidate = path.to_string();
        loop {
            match base {
                BaseKind::Content => {
                    if let Some(overlay) = self.content.try_open_dir(&candidate) {
                        return Ok((Directory::Overlay(overlay), candidate));
                    }
                    if is_archive_name(&candidate) && !self.content.is_dir(&candidate) {
                        return self.open_archive(base, &candidate);
                    }
                }
                BaseKind::Work => {
                    let work = self.work()?;
                    if work.is_dir(&candidate) {
                        return Ok((Directory::Host(work.subdir(&candidate)), candidate));
                    }
                    if is_archive_name(&candidate) && !work.is_dir(&candidate) {
                        return self.open_archive(base, &candidate);
                    }
                }
            }
            if candidate == "." {
                return Err(Error::NotFound);
            }
            candidate = split_parent(&candidate).0.to_string();
        }
    }

    /// `get_directory`'s archive-opening step (§4.1 step 5, §4.4).
    fn open_archive(&self, base: BaseKind, candidate: &str) -> Result<(Directory, String)> {
        tracing::trace!(base = base.tag(), path = candidate, "falling through to archive open");
        let (parent_path, _) = split_parent(candidate);
        let (parent_dir, parent_own_path) = self.get_directory(base, parent_path)?;
        let archive_rel = relative_to(candidate, &parent_own_path);

        let key = CacheKey {
            base: base.tag(),
            path: candidate.to_string(),
        };
        let parent_for_cache = parent_dir.clone();
        let archive_rel_for_cache = archive_rel.clone();
        let entry: Arc<CacheEntry> = self.archive_cache.get_or_parse(key, move || {
            let mut handle = parent_for_cache.open_file(&archive_rel_for_cache, false)?;
            let size = handle.size()? as usize;
            let bytes = handle.read_at(0, size)?;
            let archive = Archive::parse(&bytes)?;
            Ok(CacheEntry {
                archive: Arc::new(archive),
                buffer: Arc::new(bytes),
                parent: parent_for_cache,
            })
        })?;

        let dir = ArchiveDirectory::new(
            entry.archive.clone(),
            entry.buffer.clone(),
            entry.parent.clone(),
            archive_rel,
        );
        Ok((Directory::Archive(dir), candidate.to_string()))
    }

    fn resolve_file_dir(&self, base: BaseKind, path: &str) -> Result<(Directory, String)> {
        let (parent_path, _) = split_parent(path);
        self.get_directory(base, parent_path)
    }

    /// `get_file` (§4.1).
    fn get_file_handle(&self, base: BaseKind, path: &str, write: bool) -> Result<crate::handle::FileHandle> {
        let (dir, own_path) = self.resolve_file_dir(base, path)?;
        let rel = relative_to(path, &own_path);
        dir.open_file(&rel, write)
    }

    fn get_stats(&self, base: BaseKind, path: &str) -> Result<(Directory, Stat)> {
        let (dir, own_path) = self.resolve_file_dir(base, path)?;
        let rel = relative_to(path, &own_path);
        let stat = dir.get_file_stats(&rel)?;
        Ok((dir, stat))
    }

    /// `get_file_from_partial` (§4.1): work dir, if it has `path` as a plain
    /// host file, shadows the content device.
    fn partial_base(&self, path: &str) -> BaseKind {
        if let Some(work) = &self.work {
            if work.exists(path) {
                return BaseKind::Work;
            }
        }
        BaseKind::Content
    }

    // ---- operations object callbacks (§4.6) ----

    pub fn access(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    pub fn getattr(&self, path: &str) -> Result<Stat> {
        let base = self.partial_base(path);
        let (dir, mut stat) = self.get_stats(base, path)?;
        // Open question (§9): the rewrite-to-directory only fires when `path`
        // sits directly in a real/overlay directory, never for a member name
        // discovered one level inside an already-opened archive.
        if matches!(dir, Directory::Host(_) | Directory::Overlay(_)) && is_archive_name(path) {
            stat = stat.as_archive_root_dir();
        }
        Ok(stat)
    }

    pub fn readdir(&self, path: &str) -> Result<HashSet<String>> {
        let mut names: HashSet<String> = [".".to_string(), "..".to_string()].into_iter().collect();
        if self.work.is_some() {
            if let Ok((dir, own_path)) = self.get_directory(BaseKind::Work, path) {
                let rel = relative_to(path, &own_path);
                if let Ok(entries) = dir.list_files(&rel) {
                    names.extend(entries);
                }
            }
        }
        if let Ok((dir, own_path)) = self.get_directory(BaseKind::Content, path) {
            let rel = relative_to(path, &own_path);
            if let Ok(entries) = dir.list_files(&rel) {
                names.extend(entries);
            }
        }
        Ok(names)
    }

    pub fn open(&self, path: &str, write: bool) -> Result<u64> {
        let handle = if write {
            let work = self.work()?;
            if !work.exists(path) {
                self.promote(path)?;
            }
            self.get_file_handle(BaseKind::Work, path, true)?
        } else {
            let base = self.partial_base(path);
            self.get_file_handle(base, path, false)?
        };
        Ok(self.descriptors.allocate(handle))
    }

    /// Copy-on-write promotion (§4.7).
    fn promote(&self, path: &str) -> Result<()> {
        tracing::info!(path, "promoting into work directory");
        let work = self.work()?;
        let (parent, _) = split_parent(path);
        work.create_dir_all(parent)?;
        let mut src = self.get_file_handle(BaseKind::Content, path, false)?;
        let size = src.size()? as usize;
        let data = src.read_at(0, size)?;
        let mut dst = work.create_file(path)?;
        dst.write_at(0, &data)?;
        Ok(())
    }

    pub fn create(&self, path: &str) -> Result<u64> {
        let work = self.work()?;
        let (parent, _) = split_parent(path);
        work.create_dir_all(parent)?;
        let handle = work.create_file(path)?;
        Ok(self.descriptors.allocate(handle))
    }

    pub fn read(&self, fd: u64, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.descriptors.read(fd, offset, len)
    }

    pub fn write(&self, fd: u64, offset: u64, buf: &[u8]) -> Result<usize> {
        self.descriptors.write(fd, offset, buf)
    }

    pub fn truncate(&self, path: &str, len: u64) -> Result<()> {
        self.work()?.truncate(path, len)
    }

    pub fn unlink(&self, path: &str) -> Result<()> {
        let work = self.work()?;
        if !work.exists(path) {
            return Err(Error::ReadOnly);
        }
        work.remove_file(path)
    }

    pub fn rmdir(&self, path: &str) -> Result<()> {
        let work = self.work()?;
        if !work.exists(path) {
            return Err(Error::ReadOnly);
        }
        work.remove_dir(path)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let work = self.work()?;
        if !work.exists(from) {
            return Err(Error::ReadOnly);
        }
        work.rename(from, to)
    }

    pub fn mkdir(&self, path: &str) -> Result<()> {
        self.work()?.create_dir_all(path)
    }

    pub fn release(&self, fd: u64) {
        self.descriptors.free(fd);
    }

    pub fn statfs(&self) -> Result<FsStats> {
        let root = self
            .content
            .roots()
            .first()
            .cloned()
            .ok_or(Error::NotFound)?;
        host_statfs(&root)
    }
}

fn host_statfs(path: &std::path::Path) -> Result<FsStats> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let c_path = CString::new(path.as_os_str().as_encoded_bytes())
        .map_err(|_| Error::InvalidArgument)?;
    let mut buf = MaybeUninit::<libc::statvfs>::uninit();
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), buf.as_mut_ptr()) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    let s = unsafe { buf.assume_init() };
    Ok(FsStats {
        block_size: s.f_bsize as u64,
        blocks: s.f_blocks as u64,
        blocks_free: s.f_bfree as u64,
        blocks_available: s.f_bavail as u64,
        files: s.f_files as u64,
        files_free: s.f_ffree as u64,
        name_max: s.f_namemax as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &std::path::Path, rel: &str, contents: &[u8]) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn le(n: u16) -> [u8; 2] {
        n.to_le_bytes()
    }
    fn le32(n: u32) -> [u8; 4] {
        n.to_le_bytes()
    }

    /// A tiny SARC with `foo.bin` -> "x" and `bar/baz.bin` -> "y", matching
    /// the concrete scenario in spec.md §8 #2.
    fn build_sarc() -> Vec<u8> {
        let names = b"foo.bin\0bar/baz.bin\0";
        let mut name_table = names.to_vec();
        while name_table.len() % 4 != 0 {
            name_table.push(0);
        }
        let data = b"xy";
        let data_offset = 0x14 + 0x0C + 2 * 0x10 + 0x08 + name_table.len();

        let mut out = Vec::new();
        out.extend_from_slice(b"SARC");
        out.extend_from_slice(&le(0x14));
        out.extend_from_slice(&le(0xFFFE));
        out.extend_from_slice(&le32(0));
        out.extend_from_slice(&le32(data_offset as u32));
        out.extend_from_slice(&le(0x0100));
        out.extend_from_slice(&le(0));

        out.extend_from_slice(b"SFAT");
        out.extend_from_slice(&le(0x0C));
        out.extend_from_slice(&le(2));
        out.extend_from_slice(&le32(101));

        out.extend_from_slice(&le32(0xAAAA_0000));
        out.extend_from_slice(&le32(0xAA00_0000));
        out.extend_from_slice(&le32(0));
        out.extend_from_slice(&le32(1));
        out.extend_from_slice(&le32(0xBBBB_0000));
        out.extend_from_slice(&le32(0xAA00_0002));
        out.extend_from_slice(&le32(1));
        out.extend_from_slice(&le32(2));

        out.extend_from_slice(b"SFNT");
        out.extend_from_slice(&le(8));
        out.extend_from_slice(&le(0));
        out.extend_from_slice(&name_table);
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn reads_plain_file_and_rejects_writes_without_workdir() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "a.txt", b"hello");
        let engine = Engine::new(vec![root.path().to_path_buf()], None);

        let fd = engine.open("a.txt", false).unwrap();
        assert_eq!(engine.read(fd, 0, 5).unwrap(), b"hello");
        engine.release(fd);

        assert!(matches!(engine.open("a.txt", true), Err(Error::ReadOnly)));
        assert!(matches!(engine.mkdir("new"), Err(Error::ReadOnly)));
    }

    #[test]
    fn archive_transparency_matches_spec_scenario() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "pack.sarc", &build_sarc());
        let engine = Engine::new(vec![root.path().to_path_buf()], None);

        let stat = engine.getattr("pack.sarc").unwrap();
        assert!(stat.is_dir());

        let entries = engine.readdir("pack.sarc").unwrap();
        let expected: HashSet<String> = [".", "..", "foo.bin", "bar", ".__RAW_ARCHIVE__"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(entries, expected);

        let fd = engine.open("pack.sarc/foo.bin", false).unwrap();
        assert_eq!(engine.read(fd, 0, 8).unwrap(), b"x");
        engine.release(fd);

        let fd = engine.open("pack.sarc/bar/baz.bin", false).unwrap();
        assert_eq!(engine.read(fd, 0, 8).unwrap(), b"y");
        engine.release(fd);

        let fd = engine.open("pack.sarc/.__RAW_ARCHIVE__", false).unwrap();
        let raw = engine.read(fd, 0, 4096).unwrap();
        engine.release(fd);
        assert_eq!(raw, build_sarc());
    }

    #[test]
    fn higher_indexed_root_shadows_lower() {
        let c1 = TempDir::new().unwrap();
        let c2 = TempDir::new().unwrap();
        write_file(c1.path(), "a.txt", b"1");
        write_file(c2.path(), "a.txt", b"2");
        let engine = Engine::new(vec![c1.path().to_path_buf(), c2.path().to_path_buf()], None);

        let fd = engine.open("a.txt", false).unwrap();
        assert_eq!(engine.read(fd, 0, 1).unwrap(), b"2");
    }

    #[test]
    fn copy_on_write_promotion_preserves_archive_then_shadows_it() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "pack.sarc", &build_sarc());
        let work = TempDir::new().unwrap();
        let engine = Engine::new(vec![root.path().to_path_buf()], Some(work.path().to_path_buf()));

        let fd = engine.open("pack.sarc/foo.bin", true).unwrap();
        engine.write(fd, 0, b"X").unwrap();
        engine.release(fd);

        assert!(work.path().join("pack.sarc/foo.bin").exists());
        let on_disk = fs::read(work.path().join("pack.sarc/foo.bin")).unwrap();
        assert_eq!(on_disk, b"X");

        let fd = engine.open("pack.sarc/foo.bin", false).unwrap();
        assert_eq!(engine.read(fd, 0, 8).unwrap(), b"X");
        engine.release(fd);

        let entries = engine.readdir("pack.sarc").unwrap();
        assert!(entries.contains("foo.bin"));
    }

    #[test]
    fn descriptor_table_never_reuses_a_live_fd() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "a.txt", b"a");
        write_file(root.path(), "b.txt", b"b");
        let engine = Engine::new(vec![root.path().to_path_buf()], None);

        let a = engine.open("a.txt", false).unwrap();
        let b = engine.open("b.txt", false).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn mkdir_and_rename_require_workdir() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "a.txt", b"hello");
        let work = TempDir::new().unwrap();
        let engine = Engine::new(vec![root.path().to_path_buf()], Some(work.path().to_path_buf()));

        assert!(matches!(engine.rename("a.txt", "b.txt"), Err(Error::ReadOnly)));

        engine.mkdir("new").unwrap();
        assert!(work.path().join("new").is_dir());
    }

    #[test]
    fn empty_archive_lists_only_raw_member() {
        // Minimal SARC with zero entries.
        let mut out = Vec::new();
        let data_offset = 0x14 + 0x0C + 0x08;
        out.extend_from_slice(b"SARC");
        out.extend_from_slice(&le(0x14));
        out.extend_from_slice(&le(0xFFFE));
        out.extend_from_slice(&le32(0));
        out.extend_from_slice(&le32(data_offset as u32));
        out.extend_from_slice(&le(0x0100));
        out.extend_from_slice(&le(0));
        out.extend_from_slice(b"SFAT");
        out.extend_from_slice(&le(0x0C));
        out.extend_from_slice(&le(0));
        out.extend_from_slice(&le32(101));
        out.extend_from_slice(b"SFNT");
        out.extend_from_slice(&le(8));
        out.extend_from_slice(&le(0));

        let root = TempDir::new().unwrap();
        write_file(root.path(), "empty.sarc", &out);
        let engine = Engine::new(vec![root.path().to_path_buf()], None);

        let entries = engine.readdir("empty.sarc").unwrap();
        let expected: HashSet<String> = [".", "..", ".__RAW_ARCHIVE__"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(entries, expected);
    }
}
