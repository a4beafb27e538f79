//! # fswalker
//!
//! A synchronous, depth-first directory walker for Unix file systems.
//!
//! The walker reads directory records directly, opens sub-directories
//! relative to their parent's descriptor and classifies every entry with a
//! link-aware stat before deciding whether to visit it. Callers steer the
//! traversal through a [`TraversalPolicy`]: skip filters for paths, handles
//! and symbolic links, plus recovery hooks for stat and visit errors.
//!
//! ## Behavior
//!
//! - Pre-order: a directory is visited before its contents
//! - Sockets, named pipes and unknown file types are never visited
//! - Symbolic links to directories are followed unless a lexical check flags
//!   them as cycles (see [`is_cycle`])
//! - An optional [`Limit`] bounds the number of visited entries across all
//!   locations of one call
//! - A [`CancellationToken`] stops the traversal between entries
//!
//! ## Example
//!
//! ```rust,no_run
//! use fswalker::{CancellationToken, HookPolicy, WalkerBuilder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let walker = WalkerBuilder::new()
//!     .policy(HookPolicy::new().with_skip_path(|path| Ok(path.ends_with("target"))))
//!     .max_entries(10_000)
//!     .build();
//!
//! let ctx = CancellationToken::new();
//! let count = walker.walk(&ctx, &["/srv/data", "file:///var/log"], |_, path, file| {
//!     println!("{} ({} bytes)", path.display(), file.stat()?.size());
//!     Ok(())
//! })?;
//! println!("visited {count} entries");
//! # Ok(())
//! # }
//! ```

pub mod cached;
pub mod cancel;
pub mod cycle;
pub mod dispatch;
pub mod error;
pub mod file;
pub mod iterator;
pub mod policy;
pub mod walker;

// Re-export main types
pub use cached::CachedHandle;
pub use cancel::CancellationToken;
pub use cycle::is_cycle;
pub use dispatch::{split_uri, Location};
pub use error::{BoxError, Result, WalkError, WalkErrorKind};
pub use file::WalkFile;
pub use fs_dirent::{DirectoryFd, FileMetadata, LazyFile};
pub use iterator::{DirentReader, DirentSource};
pub use policy::{Decision, DefaultPolicy, HookPolicy, LinkStatDecision, TraversalPolicy};
pub use walker::{Limit, Progress, Walker, WalkerBuilder, WalkerConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
