//! Deferred-open file handle
//!
//! A [`LazyFile`] names a file without opening it. The first operation that
//! needs a descriptor (read, stat, or [`LazyFile::directory_fd`]) performs the
//! open; every later operation reuses that descriptor. Closing is terminal:
//! once closed, the handle never reopens and every access fails with an
//! error.

use crate::directory::DirectoryFd;
use crate::metadata::FileMetadata;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// How a pending handle will be opened
#[derive(Debug)]
enum Opener {
    /// Open by path (used for traversal roots)
    Path,
    /// Open relative to an already-open parent directory
    At { parent: DirectoryFd, name: OsString },
}

#[derive(Debug)]
enum State {
    Pending(Opener),
    Open(Arc<File>),
    Closed,
}

/// A file reference that postpones the `open(2)` until first use
///
/// # Example
///
/// ```rust,no_run
/// use fs_dirent::LazyFile;
/// use std::io::Read;
///
/// # fn example() -> std::io::Result<()> {
/// let mut file = LazyFile::new("/etc/hostname");
/// assert!(!file.is_open());
/// let mut contents = String::new();
/// file.read_to_string(&mut contents)?;
/// assert!(file.is_open());
/// file.close()?;
/// # Ok(())
/// # }
/// ```
pub struct LazyFile {
    path: PathBuf,
    state: State,
}

impl LazyFile {
    /// Create a handle that opens `path` on first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: State::Pending(Opener::Path),
        }
    }

    /// Create a handle that opens `name` relative to `parent` on first use
    ///
    /// `path` is only used for diagnostics.
    #[must_use]
    pub fn at(parent: &DirectoryFd, name: &OsStr, path: PathBuf) -> Self {
        Self {
            path,
            state: State::Pending(Opener::At {
                parent: parent.clone(),
                name: name.to_os_string(),
            }),
        }
    }

    /// Path this handle refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the underlying open has happened and the handle is not closed
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Whether [`close`](Self::close) has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Force the deferred open and return the live descriptor
    ///
    /// # Errors
    ///
    /// Returns the error from `open(2)`/`openat(2)`, or an error if the handle
    /// was already closed. A failed open leaves the handle pending.
    pub fn open(&mut self) -> io::Result<&Arc<File>> {
        if let State::Pending(opener) = &self.state {
            trace!("opening deferred file {}", self.path.display());
            let file = match opener {
                Opener::Path => File::open(&self.path)?,
                Opener::At { parent, name } => parent.open_at(name)?,
            };
            self.state = State::Open(Arc::new(file));
        }
        if let State::Open(file) = &self.state {
            return Ok(file);
        }
        Err(closed_error(&self.path))
    }

    /// Content-following metadata of the opened file
    ///
    /// # Errors
    ///
    /// Returns an error if the open or `fstat(2)` fails, or the handle is
    /// closed.
    pub fn stat(&mut self) -> io::Result<FileMetadata> {
        let file = self.open()?;
        Ok(FileMetadata::from_std(&file.metadata()?))
    }

    /// A [`DirectoryFd`] sharing this handle's descriptor
    ///
    /// # Errors
    ///
    /// Returns an error if the open fails or the handle is closed.
    pub fn directory_fd(&mut self) -> io::Result<DirectoryFd> {
        let file = Arc::clone(self.open()?);
        Ok(DirectoryFd::from_file(file, self.path.clone()))
    }

    /// Release the descriptor
    ///
    /// Closing a handle that was never opened performs no system call.
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for reporting
    /// close-time errors.
    pub fn close(&mut self) -> io::Result<()> {
        if !self.is_closed() {
            trace!("closing {}", self.path.display());
        }
        self.state = State::Closed;
        Ok(())
    }
}

impl Read for LazyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut file: &File = self.open()?;
        file.read(buf)
    }
}

impl fmt::Debug for LazyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Pending(_) => "pending",
            State::Open(_) => "open",
            State::Closed => "closed",
        };
        f.debug_struct("LazyFile")
            .field("path", &self.path)
            .field("state", &state)
            .finish()
    }
}

fn closed_error(path: &Path) -> io::Error {
    io::Error::other(format!("file handle for {} is closed", path.display()))
}
