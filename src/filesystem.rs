//! `fuser::Filesystem` adapter (§4.6): translates kernel inode-based calls
//! into [`Engine`] path-based operations. Grounded on the teacher's
//! `UrslyFS` — same inode<->path map shape, same `reply.error(errno)` style.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, Request,
};
use parking_lot::RwLock;
use tracing::{error, warn};

use crate::domain::Stat;
use crate::engine::Engine;
use crate::path_util::join;

const TTL: Duration = Duration::from_secs(1);
const ROOT_INO: u64 = 1;

pub struct SarcFs {
    engine: Arc<Engine>,
    inode_to_path: RwLock<HashMap<u64, String>>,
    path_to_inode: RwLock<HashMap<String, u64>>,
    next_inode: RwLock<u64>,
}

impl SarcFs {
    pub fn new(engine: Engine) -> Self {
        let mut inode_to_path = HashMap::new();
        let mut path_to_inode = HashMap::new();
        inode_to_path.insert(ROOT_INO, ".".to_string());
        path_to_inode.insert(".".to_string(), ROOT_INO);
        Self {
            engine: Arc::new(engine),
            inode_to_path: RwLock::new(inode_to_path),
            path_to_inode: RwLock::new(path_to_inode),
            next_inode: RwLock::new(ROOT_INO + 1),
        }
    }

    fn inode_for(&self, path: &str) -> u64 {
        if let Some(&ino) = self.path_to_inode.read().get(path) {
            return ino;
        }
        let mut next = self.next_inode.write();
        let ino = *next;
        *next += 1;
        self.inode_to_path.write().insert(ino, path.to_string());
        self.path_to_inode.write().insert(path.to_string(), ino);
        ino
    }

    fn path_for(&self, ino: u64) -> Option<String> {
        self.inode_to_path.read().get(&ino).cloned()
    }

    fn child_path(&self, parent: u64, name: &OsStr) -> Option<String> {
        let parent_path = self.path_for(parent)?;
        let name = name.to_str()?;
        Some(join(&parent_path, name))
    }

    fn attr(ino: u64, stat: &Stat) -> FileAttr {
        FileAttr {
            ino,
            size: stat.size,
            blocks: stat.blocks(),
            atime: stat.atime,
            mtime: stat.mtime,
            ctime: stat.ctime,
            crtime: stat.ctime,
            kind: if stat.is_dir() {
                FileType::Directory
            } else {
                FileType::RegularFile
            },
            perm: (stat.mode & 0o7777) as u16,
            nlink: stat.nlink,
            uid: stat.uid,
            gid: stat.gid,
            rdev: 0,
            blksize: 4096,
            flags: 0,
        }
    }
}

impl Filesystem for SarcFs {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.getattr(&path) {
            Ok(stat) => {
                let ino = self.inode_for(&path);
                reply.entry(&TTL, &Self::attr(ino, &stat), 0);
            }
            Err(e) => {
                warn!(path, error = %e, "lookup failed");
                reply.error(e.errno());
            }
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.getattr(&path) {
            Ok(stat) => reply.attr(&TTL, &Self::attr(ino, &stat)),
            Err(e) => {
                error!(path, error = %e, "getattr failed");
                reply.error(e.errno());
            }
        }
    }

    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<fuser::TimeOrNow>,
        _mtime: Option<fuser::TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        if let Some(len) = size {
            if let Err(e) = self.engine.truncate(&path, len) {
                reply.error(e.errno());
                return;
            }
        }
        match self.engine.getattr(&path) {
            Ok(stat) => reply.attr(&TTL, &Self::attr(ino, &stat)),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readdir(&mut self, _req: &Request, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.readdir(&path) {
            Ok(names) => {
                let mut sorted: Vec<&String> = names.iter().collect();
                sorted.sort();
                for (i, name) in sorted.iter().enumerate().skip(offset as usize) {
                    let kind = if name.as_str() == "." || name.as_str() == ".." {
                        FileType::Directory
                    } else {
                        let child = join(&path, name);
                        match self.engine.getattr(&child) {
                            Ok(stat) if stat.is_dir() => FileType::Directory,
                            _ => FileType::RegularFile,
                        }
                    };
                    if reply.add(ino, (i + 1) as i64, kind, name.as_str()) {
                        break;
                    }
                }
                reply.ok();
            }
            Err(e) => {
                error!(path, error = %e, "readdir failed");
                reply.error(e.errno());
            }
        }
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let write = flags & (libc::O_WRONLY | libc::O_RDWR) != 0;
        match self.engine.open(&path, write) {
            Ok(fd) => reply.opened(fd, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn create(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.create(&path) {
            Ok(fd) => {
                let ino = self.inode_for(&path);
                match self.engine.getattr(&path) {
                    Ok(stat) => reply.created(&TTL, &Self::attr(ino, &stat), 0, fd, 0),
                    Err(e) => reply.error(e.errno()),
                }
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        match self.engine.read(fh, offset as u64, size as usize) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        match self.engine.write(fh, offset as u64, data) {
            Ok(n) => reply.written(n as u32),
            Err(e) => {
                error!(fh, error = %e, "write failed");
                reply.error(e.errno());
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.engine.release(fh);
        reply.ok();
    }

    fn flush(&mut self, _req: &Request, _ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        reply.ok();
    }

    fn fsync(&mut self, _req: &Request, _ino: u64, _fh: u64, _datasync: bool, reply: ReplyEmpty) {
        reply.ok();
    }

    fn access(&mut self, _req: &Request, ino: u64, _mask: i32, reply: ReplyEmpty) {
        match self.path_for(ino) {
            Some(path) => match self.engine.access(&path) {
                Ok(()) => reply.ok(),
                Err(e) => reply.error(e.errno()),
            },
            None => reply.error(libc::ENOENT),
        }
    }

    fn mkdir(&mut self, _req: &Request, parent: u64, name: &OsStr, _mode: u32, _umask: u32, reply: ReplyEntry) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.mkdir(&path) {
            Ok(()) => match self.engine.getattr(&path) {
                Ok(stat) => {
                    let ino = self.inode_for(&path);
                    reply.entry(&TTL, &Self::attr(ino, &stat), 0);
                }
                Err(e) => reply.error(e.errno()),
            },
            Err(e) => reply.error(e.errno()),
        }
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.unlink(&path) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.rmdir(&path) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn rename(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        let (Some(from), Some(to)) = (self.child_path(parent, name), self.child_path(newparent, newname)) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.engine.rename(&from, &to) {
            Ok(()) => {
                if let Some(ino) = self.path_to_inode.write().remove(&from) {
                    self.inode_to_path.write().insert(ino, to.clone());
                    self.path_to_inode.write().insert(to, ino);
                }
                reply.ok();
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn statfs(&mut self, _req: &Request, _ino: u64, reply: ReplyStatfs) {
        match self.engine.statfs() {
            Ok(s) => reply.statfs(
                s.blocks,
                s.blocks_free,
                s.blocks_available,
                s.files,
                s.files_free,
                s.block_size as u32,
                s.name_max,
                s.block_size as u32,
            ),
            Err(e) => reply.error(e.errno()),
        }
    }
}
