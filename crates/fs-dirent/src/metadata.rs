//! File metadata and file-type classification
//!
//! `FileMetadata` is built either from a raw `libc::stat` (the link-aware,
//! descriptor-relative stat performed by [`DirectoryFd::symlink_metadata_at`])
//! or from `std::fs::Metadata` (the content-following stat of an open file).
//! Both paths produce the same value so callers classify entries uniformly.
//!
//! [`DirectoryFd::symlink_metadata_at`]: crate::DirectoryFd::symlink_metadata_at

use std::os::unix::fs::MetadataExt;

/// File metadata with the Unix fields needed for traversal decisions
///
/// # Usage
///
/// ```rust,no_run
/// use fs_dirent::FileMetadata;
///
/// # fn example() -> std::io::Result<()> {
/// let metadata = FileMetadata::from_std(&std::fs::symlink_metadata("/tmp")?);
/// assert!(metadata.is_dir());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// File mode (type + permissions)
    pub mode: u32,
    /// User ID of owner
    pub uid: u32,
    /// Group ID of owner
    pub gid: u32,
    /// Number of hard links
    pub nlink: u64,
    /// Inode number
    pub ino: u64,
    /// Device ID
    pub dev: u64,
}

impl FileMetadata {
    /// Build metadata from a raw `stat` structure
    #[must_use]
    #[allow(clippy::unnecessary_cast)] // field widths differ across Unix targets
    pub fn from_stat(stat: &libc::stat) -> Self {
        Self {
            size: stat.st_size as u64,
            mode: stat.st_mode as u32,
            uid: stat.st_uid as u32,
            gid: stat.st_gid as u32,
            nlink: stat.st_nlink as u64,
            ino: stat.st_ino as u64,
            dev: stat.st_dev as u64,
        }
    }

    /// Build metadata from `std::fs::Metadata`
    #[must_use]
    pub fn from_std(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.size(),
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            nlink: metadata.nlink(),
            ino: metadata.ino(),
            dev: metadata.dev(),
        }
    }

    /// File size in bytes
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[allow(clippy::unnecessary_cast)]
    const fn type_bits(&self) -> u32 {
        self.mode & (libc::S_IFMT as u32)
    }

    #[allow(clippy::unnecessary_cast)]
    const fn has_type(&self, bits: libc::mode_t) -> bool {
        self.type_bits() == bits as u32
    }

    /// Whether this is a directory
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.has_type(libc::S_IFDIR)
    }

    /// Whether this is a regular file
    #[must_use]
    pub const fn is_regular(&self) -> bool {
        self.has_type(libc::S_IFREG)
    }

    /// Whether this is a symbolic link
    ///
    /// Only meaningful for link-aware metadata; content-following metadata
    /// never reports a symlink.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        self.has_type(libc::S_IFLNK)
    }

    /// Whether this is a named pipe (FIFO)
    #[must_use]
    pub const fn is_named_pipe(&self) -> bool {
        self.has_type(libc::S_IFIFO)
    }

    /// Whether this is a Unix domain socket
    #[must_use]
    pub const fn is_socket(&self) -> bool {
        self.has_type(libc::S_IFSOCK)
    }

    /// Whether this is a block or character device
    #[must_use]
    pub const fn is_device(&self) -> bool {
        self.has_type(libc::S_IFBLK) || self.has_type(libc::S_IFCHR)
    }

    /// Whether the file type bits match no known file type
    #[must_use]
    pub const fn is_irregular(&self) -> bool {
        !(self.is_dir()
            || self.is_regular()
            || self.is_symlink()
            || self.is_named_pipe()
            || self.is_socket()
            || self.is_device())
    }
}
