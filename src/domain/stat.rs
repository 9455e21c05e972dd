//! Stat record synthesis (§3 "Stat record" / §4.3 `get_file_stats`).

use std::time::SystemTime;

/// POSIX-flavored stat record. `blocks` is carried for parity with the host
/// `stat(2)` struct; it's derived from `size`, not independently tracked.
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
}

impl Stat {
    pub fn blocks(&self) -> u64 {
        self.size.div_ceil(512)
    }

    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT == libc::S_IFDIR
    }

    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            mode: meta.mode(),
            nlink: meta.nlink() as u32,
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.size(),
            atime: meta.accessed().unwrap_or(SystemTime::UNIX_EPOCH),
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ctime: meta
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Rewrite an archive file's own stat into the stat of the synthesized
    /// directory standing in for it (§3: clear regular-file bits, set
    /// directory + rwx, force size to 0).
    pub fn as_archive_root_dir(&self) -> Self {
        let mut s = *self;
        s.mode = (s.mode & !libc::S_IFMT) | libc::S_IFDIR;
        s.mode |= 0o111; // ensure the x bits needed to traverse the directory
        s.size = 0;
        s
    }

    /// Rewrite an archive file's stat into the stat of one of its contained,
    /// regular-file members (§3: clear directory/exec bits, user rw, size of
    /// the member).
    pub fn as_archive_member_file(&self, member_size: u64) -> Self {
        let mut s = *self;
        s.mode = (s.mode & !libc::S_IFMT & !0o111) | libc::S_IFREG | 0o600;
        s.size = member_size;
        s
    }

    /// Rewrite an archive file's stat into a synthesized subdirectory nested
    /// inside it (§4.3: "some name contains `sub + "/"` as a substring").
    pub fn as_archive_member_dir(&self) -> Self {
        let mut s = *self;
        s.mode = (s.mode & !libc::S_IFMT) | libc::S_IFDIR | 0o700;
        s.size = 0;
        s
    }
}
