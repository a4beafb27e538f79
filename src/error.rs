//! Error types for directory traversal
//!
//! Every abort is reported as a [`WalkError`]: the failure itself
//! ([`WalkErrorKind`], which carries the path that triggered it) plus the
//! number of entries visited before the traversal stopped.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Error type returned by visit callbacks and policy hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate
pub type Result<T, E = WalkError> = std::result::Result<T, E>;

/// The specific failure that aborted a traversal
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum WalkErrorKind {
    /// Reading the next raw directory record failed.
    #[error("error reading next directory entry for {}: {source}", path.display())]
    ReadDir {
        /// Directory being read
        path: PathBuf,
        /// Underlying OS error
        source: io::Error,
    },

    /// Link-aware stat failed and the policy chose to abort.
    #[error("error link stating {}: {source}", path.display())]
    LinkStat {
        /// Entry being classified
        path: PathBuf,
        /// Error surfaced by the policy
        source: BoxError,
    },

    /// Content-following stat failed and the policy chose to abort.
    #[error("error stating {}: {source}", path.display())]
    Stat {
        /// Entry being classified
        path: PathBuf,
        /// Error surfaced by the policy
        source: BoxError,
    },

    /// The visit callback failed and the policy chose to abort.
    #[error("error calling walk function for {}: {source}", path.display())]
    Visit {
        /// Entry passed to the callback
        path: PathBuf,
        /// Error surfaced by the policy
        source: BoxError,
    },

    /// Reading a symbolic link target failed.
    #[error("error reading link {}: {source}", path.display())]
    ReadLink {
        /// The symbolic link
        path: PathBuf,
        /// Underlying OS error
        source: io::Error,
    },

    /// Opening a root or a sub-directory failed.
    #[error("error opening {}: {source}", path.display())]
    Open {
        /// Path being opened
        path: PathBuf,
        /// Underlying OS error
        source: io::Error,
    },

    /// A skip hook returned an error.
    #[error("{hook} hook failed for {}: {source}", path.display())]
    Hook {
        /// Name of the hook (`skip_path`, `skip_file` or `skip_link`)
        hook: &'static str,
        /// Path passed to the hook
        path: PathBuf,
        /// Error returned by the hook
        source: BoxError,
    },

    /// A location used a scheme with no traversal backend.
    #[error("error walking uri {location:?} ({index}): unknown scheme {scheme:?}")]
    UnknownScheme {
        /// The full location string
        location: String,
        /// Position of the location in the input list
        index: usize,
        /// The unrecognized scheme
        scheme: String,
    },

    /// The object-store backend failed.
    #[error("error walking bucket {bucket:?}: {source}")]
    Bucket {
        /// Bucket name
        bucket: String,
        /// Backend error
        source: BoxError,
    },

    /// The cancellation token was triggered.
    #[error("traversal cancelled")]
    Cancelled,
}

impl WalkErrorKind {
    /// Attach the number of entries visited before this failure
    pub(crate) fn after(self, visited: usize) -> WalkError {
        WalkError {
            kind: self,
            visited,
        }
    }

    /// Path associated with the failure, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ReadDir { path, .. }
            | Self::LinkStat { path, .. }
            | Self::Stat { path, .. }
            | Self::Visit { path, .. }
            | Self::ReadLink { path, .. }
            | Self::Open { path, .. }
            | Self::Hook { path, .. } => Some(path),
            Self::UnknownScheme { .. } | Self::Bucket { .. } | Self::Cancelled => None,
        }
    }
}

/// Error returned when a traversal aborts
///
/// # Examples
///
/// ```rust
/// use fswalker::{CancellationToken, Walker};
///
/// let walker = Walker::builder().build();
/// let ctx = CancellationToken::new();
/// let err = walker
///     .walk(&ctx, &["foo://bar"], |_, _, _| Ok(()))
///     .unwrap_err();
/// assert_eq!(err.visited(), 0);
/// assert!(err.to_string().contains("unknown scheme"));
/// ```
#[derive(Debug)]
pub struct WalkError {
    kind: WalkErrorKind,
    visited: usize,
}

impl WalkError {
    /// Returns the specific failure that terminated traversal
    #[must_use]
    pub fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Consumes the error and returns the failure
    #[must_use]
    pub fn into_kind(self) -> WalkErrorKind {
        self.kind
    }

    /// Number of entries visited before the traversal aborted
    ///
    /// Completed work is never rolled back, so this includes every entry the
    /// visit callback was invoked for, across all locations of the call.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Path associated with the failure, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.kind.path()
    }

    /// Whether the traversal stopped because of cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, WalkErrorKind::Cancelled)
    }

    /// Add entries visited by enclosing frames before the failing one
    pub(crate) fn offset_visited(mut self, visited: usize) -> Self {
        self.visited += visited;
        self
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

/// Duplicate an I/O error so one copy can be remembered and another returned
///
/// OS errors keep their error code; other errors keep their kind and message.
pub(crate) fn replay_io_error(err: &io::Error) -> io::Error {
    match err.raw_os_error() {
        Some(code) => io::Error::from_raw_os_error(code),
        None => io::Error::new(err.kind(), err.to_string()),
    }
}
