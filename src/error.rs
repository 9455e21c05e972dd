//! Crate-wide error type, mapped to POSIX errno at the FUSE boundary.

use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds the engine can raise. Each maps to a single errno so that
/// [`filesystem::Operations`](crate::filesystem::Operations) never has to guess
/// which code to hand back to the mount host.
#[derive(Debug)]
pub enum Error {
    /// Path does not exist in the work dir, any content root, or any archive.
    NotFound,
    /// A mutating call was attempted with no work directory, or against an
    /// archive member, or against a content-device file that was never promoted.
    ReadOnly,
    /// The path exists but is not the kind of entry the caller expected
    /// (e.g. `open_file` on something that resolved to a directory).
    NotADirectory,
    IsADirectory,
    InvalidArgument,
    /// Archive bytes did not parse. Callers fall back to treating the path as
    /// a regular (non-archive) file, per the archive-transparency contract.
    Parse(String),
    Io(io::Error),
}

impl Error {
    pub fn errno(&self) -> i32 {
        match self {
            Error::NotFound => libc::ENOENT,
            Error::ReadOnly => libc::EROFS,
            Error::NotADirectory => libc::ENOTDIR,
            Error::IsADirectory => libc::EISDIR,
            Error::InvalidArgument => libc::EINVAL,
            Error::Parse(_) => libc::ENOENT,
            Error::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "no such file or directory"),
            Error::ReadOnly => write!(f, "read-only filesystem"),
            Error::NotADirectory => write!(f, "not a directory"),
            Error::IsADirectory => write!(f, "is a directory"),
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::Parse(msg) => write!(f, "archive parse error: {msg}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound,
            io::ErrorKind::PermissionDenied => Error::Io(e),
            io::ErrorKind::AlreadyExists => Error::Io(e),
            _ => Error::Io(e),
        }
    }
}
