//! Handle wrapper that remembers its first metadata result
//!
//! The walker, the visit callback and every policy hook may all ask for the
//! same entry's metadata. [`CachedHandle`] performs the underlying stat once
//! and answers later calls from memory, replaying a failure as well as a
//! success.

use crate::error::replay_io_error;
use crate::file::WalkFile;
use fs_dirent::{DirectoryFd, FileMetadata, LazyFile};
use std::io::{self, Read};
use std::path::Path;

/// A [`WalkFile`] whose `stat` runs at most once
#[derive(Debug)]
pub struct CachedHandle<F = LazyFile> {
    inner: F,
    stat: Option<io::Result<FileMetadata>>,
}

impl<F: WalkFile> CachedHandle<F> {
    /// Wrap a handle; nothing is cached until the first `stat`
    pub fn new(inner: F) -> Self {
        Self { inner, stat: None }
    }

    /// Whether a metadata result (success or failure) is remembered
    pub fn is_cached(&self) -> bool {
        self.stat.is_some()
    }

    /// The wrapped handle
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Mutable access to the wrapped handle
    pub fn inner_mut(&mut self) -> &mut F {
        &mut self.inner
    }

    /// Unwrap, discarding the cached result
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl CachedHandle<LazyFile> {
    /// Path of the wrapped entry
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Share the entry's descriptor as a directory for child operations
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be opened or was already closed.
    pub fn directory_fd(&mut self) -> io::Result<DirectoryFd> {
        self.inner.directory_fd()
    }
}

impl<F: WalkFile> WalkFile for CachedHandle<F> {
    fn stat(&mut self) -> io::Result<FileMetadata> {
        match &self.stat {
            Some(Ok(metadata)) => Ok(*metadata),
            Some(Err(err)) => Err(replay_io_error(err)),
            None => {
                let result = self.inner.stat();
                let replay = match &result {
                    Ok(metadata) => Ok(*metadata),
                    Err(err) => Err(replay_io_error(err)),
                };
                self.stat = Some(result);
                replay
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}

impl<F: Read> Read for CachedHandle<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
