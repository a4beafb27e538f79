//! # fs-dirent
//!
//! Descriptor-relative directory primitives used by `fswalker`:
//! - Raw directory-record reading (`getdents64`) and record parsing
//! - Link-aware child metadata, link targets and child opens via `*at` syscalls
//! - File-type classification of Unix mode bits
//! - Deferred-open file handles
//!
//! Everything here is synchronous and returns [`std::io::Result`], so callers
//! keep the OS error kind (`NotFound`, `PermissionDenied`, ...) for their own
//! recovery decisions.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fs_dirent::{DirectoryFd, LazyFile};
//! use std::path::Path;
//!
//! # fn example() -> std::io::Result<()> {
//! let dir = DirectoryFd::open(Path::new("/var/log"))?;
//! let mut child = LazyFile::at(&dir, "syslog".as_ref(), "/var/log/syslog".into());
//! println!("size: {}", child.stat()?.size());
//! child.close()?;
//! # Ok(())
//! # }
//! ```

#[cfg(not(unix))]
compile_error!("fs-dirent supports Unix targets only");

pub mod directory;
pub mod dirent;
pub mod lazy_file;
pub mod metadata;

// Re-export main types
pub use directory::DirectoryFd;
pub use lazy_file::LazyFile;
pub use metadata::FileMetadata;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
