//! Directory file descriptor for secure directory-relative operations

use crate::metadata::FileMetadata;
use nix::fcntl::{self, AtFlags, OFlag};
use nix::sys::stat::{fstatat, Mode};
use std::ffi::OsStr;
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A directory file descriptor for secure directory-relative operations
///
/// `DirectoryFd` wraps an open directory so children can be inspected and
/// opened with `*at` system calls instead of re-resolving a path. Once the
/// descriptor is open, renaming or replacing the directory's path cannot
/// redirect later operations to a different directory.
///
/// Cloning is cheap: clones share the same descriptor, which closes when the
/// last clone is dropped.
///
/// # Example
///
/// ```rust,no_run
/// use fs_dirent::DirectoryFd;
/// use std::path::Path;
///
/// # fn example() -> std::io::Result<()> {
/// let dir_fd = DirectoryFd::open(Path::new("/some/directory"))?;
/// let metadata = dir_fd.symlink_metadata_at("child".as_ref())?;
/// println!("child is a directory: {}", metadata.is_dir());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryFd {
    /// The underlying file descriptor
    file: Arc<File>,
    /// The path this directory represents (for debugging/error messages)
    path: PathBuf,
}

impl DirectoryFd {
    /// Open a directory and return a `DirectoryFd`
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The path doesn't exist
    /// - Permission is denied
    /// - The operation fails due to I/O errors
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_file(Arc::new(file), path.to_path_buf()))
    }

    /// Wrap an already-open descriptor
    ///
    /// The descriptor is expected to refer to a directory; directory reads
    /// through it fail with `ENOTDIR` otherwise.
    #[must_use]
    pub fn from_file(file: Arc<File>, path: PathBuf) -> Self {
        Self { file, path }
    }

    /// Get the path this directory represents
    ///
    /// This is primarily used for error messages and debugging.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the raw file descriptor for use with system calls
    #[must_use]
    pub fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Get link-aware metadata for a child
    ///
    /// Uses `fstatat(2)` with `AT_SYMLINK_NOFOLLOW`, so a symlink child is
    /// reported as a symlink rather than as its target.
    ///
    /// # Errors
    ///
    /// Returns an error if the child doesn't exist, permission is denied, or
    /// `name` contains a NUL byte.
    pub fn symlink_metadata_at(&self, name: &OsStr) -> io::Result<FileMetadata> {
        let stat = fstatat(Some(self.as_raw_fd()), name, AtFlags::AT_SYMLINK_NOFOLLOW)?;
        Ok(FileMetadata::from_stat(&stat))
    }

    /// Read the target of a symbolic link child
    ///
    /// Uses `readlinkat(2)` with this directory's descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the child doesn't exist, is not a symbolic link, or
    /// permission is denied.
    pub fn readlinkat(&self, name: &OsStr) -> io::Result<PathBuf> {
        let target = fcntl::readlinkat(Some(self.as_raw_fd()), name)?;
        Ok(PathBuf::from(target))
    }

    /// Open a child read-only relative to this directory
    ///
    /// Uses `openat(2)` with `O_RDONLY | O_CLOEXEC`. A trailing symlink is
    /// followed, so opening a link to a directory yields the target
    /// directory's descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the child doesn't exist, permission is denied, or
    /// `name` contains a NUL byte.
    pub fn open_at(&self, name: &OsStr) -> io::Result<File> {
        let fd = fcntl::openat(
            Some(self.as_raw_fd()),
            name,
            OFlag::O_RDONLY | OFlag::O_CLOEXEC,
            Mode::empty(),
        )?;
        // SAFETY: openat returned a fresh descriptor that nothing else owns.
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(File::from(owned))
    }
}

impl AsFd for DirectoryFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}
